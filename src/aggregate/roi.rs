use super::{AgeBucket, Percent};
use crate::records::RoiRecord;
use serde::{Deserialize, Serialize};

/// Chart row built from the first predicted cost of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiCostRow {
    pub patient_id: String,
    pub proactive: f64,
    pub reactive: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSavings {
    pub bucket: AgeBucket,
    pub avg_savings: f64,
}

/// Per-patient totals summed over every predicted cost of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPatient {
    pub id: String,
    pub conditions: String,
    pub proactive_total: f64,
    pub reactive_total: f64,
    pub savings_total: f64,
    pub savings_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalTotals {
    pub patient_count: usize,
    pub proactive_total: f64,
    pub reactive_total: f64,
    /// Reactive minus proactive, not the sum of reported savings.
    pub savings: f64,
    pub savings_percent: Percent,
    pub average_savings_per_patient: f64,
}

impl HospitalTotals {
    /// Average savings rounded to whole currency units, as shown on the summary card.
    pub fn rounded_average_savings(&self) -> f64 {
        self.average_savings_per_patient.round()
    }
}

pub fn roi_cost_rows(roi_records: &[RoiRecord]) -> Vec<RoiCostRow> {
    roi_records
        .iter()
        .map(|record| {
            let cost = record.first_cost();
            RoiCostRow {
                patient_id: record.id().unwrap_or_default().to_string(),
                proactive: cost.and_then(|c| c.proactive_cost).unwrap_or(0.0),
                reactive: cost.and_then(|c| c.reactive_cost).unwrap_or(0.0),
                savings: cost.and_then(|c| c.potential_savings).unwrap_or(0.0),
            }
        })
        .collect()
}

pub fn avg_savings_by_age_bucket(roi_records: &[RoiRecord]) -> Vec<BucketSavings> {
    let mut sums = [(0.0_f64, 0_usize); 4];
    
    for record in roi_records {
        let bucket = AgeBucket::from_age(record.age_used_for_prediction.unwrap_or(0));
        let savings = record
            .first_cost()
            .and_then(|c| c.potential_savings)
            .unwrap_or(0.0);
        let slot = &mut sums[bucket.index()];
        slot.0 += savings;
        slot.1 += 1;
    }
    
    AgeBucket::ALL
        .iter()
        .map(|bucket| {
            let (sum, count) = sums[bucket.index()];
            BucketSavings {
                bucket: *bucket,
                avg_savings: if count > 0 { sum / count as f64 } else { 0.0 },
            }
        })
        .collect()
}

/// Records without predicted costs are dropped rather than zero-filled.
pub fn aggregated_patients(roi_records: &[RoiRecord]) -> Vec<AggregatedPatient> {
    roi_records
        .iter()
        .filter(|record| !record.predicted_costs.is_empty())
        .map(|record| {
            let costs = &record.predicted_costs;
            let proactive_total: f64 = costs.iter().map(|c| c.proactive_cost.unwrap_or(0.0)).sum();
            let reactive_total: f64 = costs.iter().map(|c| c.reactive_cost.unwrap_or(0.0)).sum();
            let savings_total: f64 = costs.iter().map(|c| c.potential_savings.unwrap_or(0.0)).sum();
            
            AggregatedPatient {
                id: record.id().unwrap_or_default().to_string(),
                conditions: costs
                    .iter()
                    .map(|c| c.condition.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(", "),
                proactive_total,
                reactive_total,
                savings_total,
                savings_percent: Percent::of(savings_total, reactive_total),
            }
        })
        .collect()
}

pub fn hospital_totals(patients: &[AggregatedPatient]) -> HospitalTotals {
    let proactive_total: f64 = patients.iter().map(|p| p.proactive_total).sum();
    let reactive_total: f64 = patients.iter().map(|p| p.reactive_total).sum();
    let savings = reactive_total - proactive_total;
    
    HospitalTotals {
        patient_count: patients.len(),
        proactive_total,
        reactive_total,
        savings,
        savings_percent: Percent::of(savings, reactive_total),
        average_savings_per_patient: average_savings_per_patient(savings, patients.len()),
    }
}

pub fn average_savings_per_patient(savings: f64, count: usize) -> f64 {
    if count > 0 {
        savings / count as f64
    } else {
        0.0
    }
}
