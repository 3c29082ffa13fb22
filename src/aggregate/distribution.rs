use super::AgeBucket;
use crate::records::{PatientRecord, RiskTier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCount {
    pub factor: String,
    pub count: usize,
}

/// Counts the first-outcome tier of every patient.
pub fn tier_distribution(patients: &[PatientRecord]) -> BTreeMap<RiskTier, usize> {
    let mut counts = BTreeMap::new();
    for patient in patients {
        *counts.entry(patient.primary_tier()).or_insert(0) += 1;
    }
    counts
}

/// Missing ages count as 0 and therefore land in `Young`.
pub fn age_bucket_distribution(patients: &[PatientRecord]) -> BTreeMap<AgeBucket, usize> {
    let mut counts: BTreeMap<AgeBucket, usize> =
        AgeBucket::ALL.iter().map(|bucket| (*bucket, 0)).collect();
    
    for patient in patients {
        let bucket = AgeBucket::from_age(patient.age.unwrap_or(0));
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts
}

/// Most frequent first-outcome risk factors, highest count first.
///
/// Ties keep the order in which the factor was first seen.
pub fn top_risk_factors(patients: &[PatientRecord], n: usize) -> Vec<FactorCount> {
    let mut order: Vec<FactorCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    
    for factor in patients.iter().flat_map(|p| p.primary_risk_factors()) {
        match index.get(factor.as_str()).copied() {
            Some(i) => order[i].count += 1,
            None => {
                index.insert(factor.as_str(), order.len());
                order.push(FactorCount { factor: factor.clone(), count: 1 });
            }
        }
    }
    
    // sort_by is stable
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(n);
    order
}
