//! Pure reductions over an [`AnalysisSnapshot`].
//!
//! Nothing here fails: missing nested fields count as zero or empty.

pub mod distribution;
pub mod roi;

use crate::records::{AnalysisSnapshot, RiskTier};
use crate::report::narrative::{patient_summaries, PatientSummary};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

pub use distribution::*;
pub use roi::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBucket {
    Young,
    Adult,
    #[serde(rename = "Middle Age")]
    MiddleAge,
    Senior,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Young,
        AgeBucket::Adult,
        AgeBucket::MiddleAge,
        AgeBucket::Senior,
    ];
    
    /// Upper bounds are inclusive: 30, 50 and 70.
    pub fn from_age(age: u32) -> Self {
        if age <= 30 {
            AgeBucket::Young
        } else if age <= 50 {
            AgeBucket::Adult
        } else if age <= 70 {
            AgeBucket::MiddleAge
        } else {
            AgeBucket::Senior
        }
    }
    
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Young => "Young",
            AgeBucket::Adult => "Adult",
            AgeBucket::MiddleAge => "Middle Age",
            AgeBucket::Senior => "Senior",
        }
    }
    
    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Percentage shown with one decimal; serialized as that display string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Percent(f64);

impl Percent {
    /// `part / whole * 100`, or zero when `whole` is not positive.
    pub fn of(part: f64, whole: f64) -> Self {
        if whole > 0.0 {
            Percent(part / whole * 100.0)
        } else {
            Percent(0.0)
        }
    }
    
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every derived view of one snapshot, recomputed from scratch.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub n_patients: usize,
    pub n_roi_records: usize,
    pub tier_distribution: BTreeMap<RiskTier, usize>,
    pub age_distribution: BTreeMap<AgeBucket, usize>,
    pub top_risk_factors: Vec<FactorCount>,
    pub roi_cost_rows: Vec<RoiCostRow>,
    pub avg_savings_by_age: Vec<BucketSavings>,
    pub aggregated_patients: Vec<AggregatedPatient>,
    pub hospital_totals: HospitalTotals,
    pub patient_summaries: Vec<PatientSummary>,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &AnalysisSnapshot, top_n: usize) -> Self {
        let aggregated = aggregated_patients(&snapshot.roi_data);
        let totals = hospital_totals(&aggregated);
        
        Self {
            n_patients: snapshot.predictions.len(),
            n_roi_records: snapshot.roi_data.len(),
            tier_distribution: tier_distribution(&snapshot.predictions),
            age_distribution: age_bucket_distribution(&snapshot.predictions),
            top_risk_factors: top_risk_factors(&snapshot.predictions, top_n),
            roi_cost_rows: roi_cost_rows(&snapshot.roi_data),
            avg_savings_by_age: avg_savings_by_age_bucket(&snapshot.roi_data),
            aggregated_patients: aggregated,
            hospital_totals: totals,
            patient_summaries: patient_summaries(&snapshot.predictions, &snapshot.roi_data),
        }
    }
}
