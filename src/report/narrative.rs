//! Per-patient narrative blocks joined with the matching ROI record.

use super::NOT_AVAILABLE;
use crate::records::{PatientRecord, RoiRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub proactive: String,
    pub reactive: String,
    pub savings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub age: String,
    pub overall_risk_score: String,
    pub primary_condition: String,
    pub risk_tier: String,
    pub key_risk_factors: String,
    pub costs: Option<CostSummary>,
}

impl PatientSummary {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.patient_id.clone(),
            format!("Age: {}", self.age),
            format!("Overall Risk Score: {}", self.overall_risk_score),
            format!("Primary Condition: {}", self.primary_condition),
            format!("Risk Tier: {}", self.risk_tier),
            format!("Key Risk Factors: {}", self.key_risk_factors),
        ];
        if let Some(costs) = &self.costs {
            lines.push(format!("Predicted Proactive Cost: ${}", costs.proactive));
            lines.push(format!("Predicted Reactive Cost: ${}", costs.reactive));
            lines.push(format!("Potential Savings: ${}", costs.savings));
        }
        lines
    }
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// One summary per patient. Costs come from the first predicted cost of the
/// ROI record with the same id, when there is one.
pub fn patient_summaries(patients: &[PatientRecord], roi_records: &[RoiRecord]) -> Vec<PatientSummary> {
    patients
        .iter()
        .map(|patient| {
            let roi = patient
                .id()
                .and_then(|id| roi_records.iter().find(|r| r.id() == Some(id)));
            let outcome = patient.first_outcome();
            let factors = patient.primary_risk_factors();
            
            PatientSummary {
                patient_id: text(patient.id().map(str::to_string)),
                age: text(patient.age.map(|a| a.to_string())),
                overall_risk_score: text(patient.risk_score().map(|s| s.to_string())),
                primary_condition: text(patient.primary_condition.clone()),
                risk_tier: text(outcome.and_then(|o| o.risk_tier.as_ref()).map(|t| t.raw().to_string())),
                key_risk_factors: if factors.is_empty() {
                    NOT_AVAILABLE.to_string()
                } else {
                    factors.join(", ")
                },
                costs: roi.and_then(|r| r.first_cost()).map(|cost| CostSummary {
                    proactive: money(cost.proactive_cost),
                    reactive: money(cost.reactive_cost),
                    savings: money(cost.potential_savings),
                }),
            }
        })
        .collect()
}
