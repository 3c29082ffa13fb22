//! Records returned by the prediction service.
//!
//! Every wire field is optional: the service builds these from pandas rows,
//! so numbers can arrive as floats, strings or `null`. Fields are kept as
//! `Option`s here and each consumer applies its own default.

mod lenient;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use crate::error::ReportResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskTier {
    Minimal,
    Low,
    Moderate,
    High,
    Unknown,
}

impl RiskTier {
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Minimal,
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::High,
        RiskTier::Unknown,
    ];
    
    /// Accepts both bare labels (`High`) and service labels (`Tier 4: High Risk`).
    pub fn parse(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("high") {
            RiskTier::High
        } else if label.contains("moderate") {
            RiskTier::Moderate
        } else if label.contains("low") {
            RiskTier::Low
        } else if label.contains("minimal") {
            RiskTier::Minimal
        } else {
            RiskTier::Unknown
        }
    }
    
    /// Thresholds used by the service when it assigns a tier.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            RiskTier::High
        } else if score >= 0.50 {
            RiskTier::Moderate
        } else if score >= 0.25 {
            RiskTier::Low
        } else if score >= 0.0 {
            RiskTier::Minimal
        } else {
            RiskTier::Unknown
        }
    }
    
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Minimal => "Minimal",
            RiskTier::Low => "Low",
            RiskTier::Moderate => "Moderate",
            RiskTier::High => "High",
            RiskTier::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RiskTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for RiskTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(RiskTier::parse(&label))
    }
}

/// A tier as the service wrote it, alongside its parsed [`RiskTier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLabel {
    raw: String,
    tier: RiskTier,
}

impl TierLabel {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tier = RiskTier::parse(&raw);
        Self { raw, tier }
    }
    
    pub fn raw(&self) -> &str {
        &self.raw
    }
    
    pub fn tier(&self) -> RiskTier {
        self.tier
    }
}

impl From<RiskTier> for TierLabel {
    fn from(tier: RiskTier) -> Self {
        Self {
            raw: tier.label().to_string(),
            tier,
        }
    }
}

impl Serialize for TierLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedOutcome {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    
    #[serde(rename = "riskScore", default, deserialize_with = "lenient::opt_f64")]
    pub risk_score: Option<f64>,
    
    #[serde(rename = "riskTier", default, deserialize_with = "lenient::opt_tier")]
    pub risk_tier: Option<TierLabel>,
    
    #[serde(rename = "keyRiskFactors", default, deserialize_with = "lenient::string_list")]
    pub key_risk_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "patientId", default, deserialize_with = "lenient::opt_string")]
    pub patient_id: Option<String>,
    
    /// Raw dataset key, sent by some service builds instead of `patientId`.
    #[serde(rename = "DESYNPUF_ID", default, deserialize_with = "lenient::opt_string")]
    pub desynpuf_id: Option<String>,
    
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub age: Option<u32>,
    
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub income: Option<String>,
    
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub employment: Option<String>,
    
    #[serde(rename = "hospital_visit", default, deserialize_with = "lenient::opt_u32")]
    pub hospital_visit_count: Option<u32>,
    
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub primary_condition: Option<String>,
    
    #[serde(rename = "risk_score", default, deserialize_with = "lenient::opt_f64")]
    pub overall_risk_score: Option<f64>,
    
    /// Dashboard spelling of `risk_score`.
    #[serde(rename = "overallRiskScore", default, deserialize_with = "lenient::opt_f64")]
    pub overall_risk_score_camel: Option<f64>,
    
    #[serde(rename = "predictedOutcomes", default, deserialize_with = "lenient::list")]
    pub predicted_outcomes: Vec<PredictedOutcome>,
}

impl PatientRecord {
    /// `patientId`, falling back to `DESYNPUF_ID`.
    pub fn id(&self) -> Option<&str> {
        self.patient_id.as_deref().or(self.desynpuf_id.as_deref())
    }
    
    /// `risk_score`, falling back to `overallRiskScore`.
    pub fn risk_score(&self) -> Option<f64> {
        self.overall_risk_score.or(self.overall_risk_score_camel)
    }
    
    pub fn first_outcome(&self) -> Option<&PredictedOutcome> {
        self.predicted_outcomes.first()
    }
    
    /// Tier of the first outcome, `Unknown` when there is none.
    pub fn primary_tier(&self) -> RiskTier {
        self.first_outcome()
            .and_then(|o| o.risk_tier.as_ref())
            .map(TierLabel::tier)
            .unwrap_or(RiskTier::Unknown)
    }
    
    pub fn primary_risk_factors(&self) -> &[String] {
        self.first_outcome()
            .map(|o| o.key_risk_factors.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedCost {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub condition: Option<String>,
    
    #[serde(rename = "predicted_proactive_cost", default, deserialize_with = "lenient::opt_f64")]
    pub proactive_cost: Option<f64>,
    
    #[serde(rename = "predicted_reactive_cost", default, deserialize_with = "lenient::opt_f64")]
    pub reactive_cost: Option<f64>,
    
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub potential_savings: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRecord {
    #[serde(rename = "patientId", default, deserialize_with = "lenient::opt_string")]
    pub patient_id: Option<String>,
    
    #[serde(rename = "DESYNPUF_ID", default, deserialize_with = "lenient::opt_string")]
    pub desynpuf_id: Option<String>,
    
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub age_used_for_prediction: Option<u32>,
    
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub primary_condition: Option<String>,
    
    #[serde(rename = "predictedCosts", default, deserialize_with = "lenient::list")]
    pub predicted_costs: Vec<PredictedCost>,
}

impl RoiRecord {
    pub fn id(&self) -> Option<&str> {
        self.patient_id.as_deref().or(self.desynpuf_id.as_deref())
    }
    
    pub fn first_cost(&self) -> Option<&PredictedCost> {
        self.predicted_costs.first()
    }
}

/// Body of a `/predict` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(default)]
    pub status: Option<String>,
    
    #[serde(default)]
    pub message: Option<String>,
    
    #[serde(default, deserialize_with = "lenient::list")]
    pub predictions: Vec<PatientRecord>,
    
    #[serde(rename = "roiReport", default, deserialize_with = "lenient::list")]
    pub roi_report: Vec<RoiRecord>,
}

impl PredictionPayload {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
    
    /// The service answers 200 with `status: "error"` when it cannot read the CSV.
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
    
    pub fn into_snapshot(self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            predictions: self.predictions,
            roi_data: self.roi_report,
        }
    }
}

/// Immutable hand-off between the upload step and every derived view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub predictions: Vec<PatientRecord>,
    pub roi_data: Vec<RoiRecord>,
}

impl AnalysisSnapshot {
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty() && self.roi_data.is_empty()
    }
}
