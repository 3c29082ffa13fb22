//! Report compilation: turns a snapshot into named tables ready for export.
//!
//! The compiler only builds data. Layout and file output live in
//! [`crate::output`].

pub mod narrative;

use crate::records::{AnalysisSnapshot, PatientRecord, RoiRecord};
use chrono::{DateTime, Local};
use serde::Serialize;

pub const NOT_AVAILABLE: &str = "N/A";
pub const REPORT_TITLE: &str = "Analysis Report";

/// Sections in the order they appear in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SectionKind {
    PatientInformation,
    RiskAndOutcomes,
    RoiData,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::PatientInformation => "Patient Information",
            SectionKind::RiskAndOutcomes => "Risk & Outcomes",
            SectionKind::RoiData => "ROI Data",
        }
    }
    
    pub fn file_stem(&self) -> &'static str {
        match self {
            SectionKind::PatientInformation => "patient_information",
            SectionKind::RiskAndOutcomes => "risk_and_outcomes",
            SectionKind::RoiData => "roi_data",
        }
    }
    
    fn header(&self) -> &'static [&'static str] {
        match self {
            SectionKind::PatientInformation => &["Patient ID", "Age", "Primary Condition"],
            SectionKind::RiskAndOutcomes => &["Condition", "Risk Score", "Risk Tier", "Key Risk Factors"],
            SectionKind::RoiData => &[
                "Patient ID",
                "Age",
                "Primary Condition",
                "Proactive Cost",
                "Reactive Cost",
                "Potential Savings",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn new(kind: SectionKind, rows: Vec<Vec<String>>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            header: kind.header().iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn compile(snapshot: &AnalysisSnapshot, generated_at: DateTime<Local>) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            generated_at,
            sections: compile_sections(&snapshot.predictions, &snapshot.roi_data),
        }
    }
    
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Builds the three report tables, dropping any that would have no rows.
pub fn compile_sections(patients: &[PatientRecord], roi_records: &[RoiRecord]) -> Vec<Section> {
    [
        Section::new(SectionKind::PatientInformation, patient_information_rows(patients)),
        Section::new(SectionKind::RiskAndOutcomes, risk_outcome_rows(patients)),
        Section::new(SectionKind::RoiData, roi_rows(roi_records)),
    ]
    .into_iter()
    .filter(|section| !section.rows.is_empty())
    .collect()
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn patient_information_rows(patients: &[PatientRecord]) -> Vec<Vec<String>> {
    patients
        .iter()
        .map(|p| {
            vec![
                or_na(p.id().map(str::to_string)),
                or_na(p.age.map(|a| a.to_string())),
                or_na(p.primary_condition.clone()),
            ]
        })
        .collect()
}

// Every outcome, not just the first one.
fn risk_outcome_rows(patients: &[PatientRecord]) -> Vec<Vec<String>> {
    patients
        .iter()
        .flat_map(|p| p.predicted_outcomes.iter())
        .map(|outcome| {
            vec![
                outcome.condition.clone().unwrap_or_default(),
                outcome.risk_score.map(|s| s.to_string()).unwrap_or_default(),
                outcome.risk_tier.as_ref().map(|t| t.raw().to_string()).unwrap_or_default(),
                outcome.key_risk_factors.join(", "),
            ]
        })
        .collect()
}

fn roi_rows(roi_records: &[RoiRecord]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for record in roi_records {
        for cost in &record.predicted_costs {
            rows.push(vec![
                or_na(record.id().map(str::to_string)),
                or_na(record.age_used_for_prediction.map(|a| a.to_string())),
                or_na(cost.condition.clone().or_else(|| record.primary_condition.clone())),
                or_na(cost.proactive_cost.map(|c| c.to_string())),
                or_na(cost.reactive_cost.map(|c| c.to_string())),
                or_na(cost.potential_savings.map(|c| c.to_string())),
            ]);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{PredictedCost, PredictedOutcome, RiskTier, TierLabel};
    
    fn outcome(condition: &str, score: f64, tier: RiskTier, factors: &[&str]) -> PredictedOutcome {
        PredictedOutcome {
            condition: Some(condition.to_string()),
            risk_score: Some(score),
            risk_tier: Some(tier.into()),
            key_risk_factors: factors.iter().map(|f| f.to_string()).collect(),
        }
    }
    
    #[test]
    fn test_empty_input_has_no_sections() {
        assert!(compile_sections(&[], &[]).is_empty());
        
        let doc = ReportDocument::compile(&AnalysisSnapshot::default(), Local::now());
        assert!(doc.is_empty());
        assert_eq!(doc.title, REPORT_TITLE);
    }
    
    #[test]
    fn test_sections_in_fixed_order() {
        let patients = vec![PatientRecord {
            patient_id: Some("P1".to_string()),
            age: Some(64),
            primary_condition: Some("COPD".to_string()),
            predicted_outcomes: vec![
                outcome("COPD", 0.61, RiskTier::Moderate, &["SP_COPD", "Age"]),
                outcome("HEART FAILURE", 0.2, RiskTier::Minimal, &[]),
            ],
            ..PatientRecord::default()
        }];
        let roi = vec![RoiRecord {
            patient_id: Some("P1".to_string()),
            desynpuf_id: None,
            age_used_for_prediction: Some(64),
            primary_condition: None,
            predicted_costs: vec![PredictedCost {
                condition: Some("COPD".to_string()),
                proactive_cost: Some(1500.25),
                reactive_cost: Some(6000.0),
                potential_savings: Some(4499.75),
            }],
        }];
        
        let sections = compile_sections(&patients, &roi);
        let kinds: Vec<_> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![
            SectionKind::PatientInformation,
            SectionKind::RiskAndOutcomes,
            SectionKind::RoiData,
        ]);
        
        assert_eq!(sections[0].rows[0], vec!["P1", "64", "COPD"]);
        assert_eq!(sections[1].rows.len(), 2);
        assert_eq!(sections[1].rows[0], vec!["COPD", "0.61", "Moderate", "SP_COPD, Age"]);
        assert_eq!(sections[2].header.len(), 6);
        assert_eq!(sections[2].rows[0], vec!["P1", "64", "COPD", "1500.25", "6000", "4499.75"]);
    }
    
    #[test]
    fn test_missing_fields_render_not_available() {
        let patients = vec![PatientRecord::default()];
        let roi = vec![RoiRecord {
            patient_id: None,
            desynpuf_id: None,
            age_used_for_prediction: None,
            primary_condition: Some("KIDNEY DISEASE".to_string()),
            predicted_costs: vec![PredictedCost {
                proactive_cost: Some(0.0),
                ..PredictedCost::default()
            }],
        }];
        
        let sections = compile_sections(&patients, &roi);
        // the patient has no outcomes, so that table is dropped
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].rows[0], vec!["N/A", "N/A", "N/A"]);
        assert_eq!(sections[1].kind, SectionKind::RoiData);
        assert_eq!(sections[1].rows[0], vec!["N/A", "N/A", "KIDNEY DISEASE", "0", "N/A", "N/A"]);
    }
    
    #[test]
    fn test_outcome_rows_print_service_tier_text() {
        let patients = vec![PatientRecord {
            predicted_outcomes: vec![
                PredictedOutcome {
                    condition: Some("HEART FAILURE".to_string()),
                    risk_tier: Some(TierLabel::new("Tier 4: High Risk")),
                    ..PredictedOutcome::default()
                },
                PredictedOutcome {
                    risk_tier: Some(TierLabel::new("Severe")),
                    ..PredictedOutcome::default()
                },
            ],
            ..PatientRecord::default()
        }];
        
        let sections = compile_sections(&patients, &[]);
        let outcomes = &sections[1];
        assert_eq!(outcomes.kind, SectionKind::RiskAndOutcomes);
        assert_eq!(outcomes.rows[0][2], "Tier 4: High Risk");
        assert_eq!(outcomes.rows[1][2], "Severe");
    }
    
    #[test]
    fn test_desynpuf_id_used_when_patient_id_missing() {
        let patients = vec![PatientRecord {
            desynpuf_id: Some("00013D2EFD8E45D1".to_string()),
            ..PatientRecord::default()
        }];
        let sections = compile_sections(&patients, &[]);
        assert_eq!(sections[0].rows[0][0], "00013D2EFD8E45D1");
    }
    
    #[test]
    fn test_roi_rows_cover_every_cost() {
        let roi = vec![
            RoiRecord {
                patient_id: Some("P1".to_string()),
                predicted_costs: vec![PredictedCost::default(), PredictedCost::default()],
                ..RoiRecord::default()
            },
            RoiRecord::default(),
        ];
        
        let sections = compile_sections(&[], &roi);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].rows.len(), 2);
        assert_eq!(sections[0].rows[0][2], NOT_AVAILABLE);
    }
}
