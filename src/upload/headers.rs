use crate::error::{ReportError, ReportResult};
use log::{debug, info};
use std::io::Read;
use std::path::Path;

pub const REQUIRED_FIELDS: [&str; 12] = [
    "DESYNPUF_ID",
    "Age",
    "chronic_condition_count",
    "SP_CHF",
    "SP_CHRNKIDN",
    "SP_COPD",
    "inpatient_visit_count_08_09",
    "outpatient_visit_count_08_09",
    "unique_drug_count_08_09",
    "acute_heart_failure_claim_count_08_09",
    "acute_kidney_injury_claim_count_08_09",
    "copd_exacerbation_claim_count_08_09",
];

/// Recognized but never required.
pub const OPTIONAL_FIELDS: [&str; 4] = ["location", "employee", "income", "phone_number"];

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCheck {
    pub headers: Vec<String>,
    pub optional_present: Vec<String>,
}

/// Returns the required fields absent from `headers`, in required order.
pub fn validate_headers<S: AsRef<str>>(headers: &[S], required: &[&str]) -> Result<(), Vec<String>> {
    let missing: Vec<String> = required
        .iter()
        .filter(|field| !headers.iter().any(|h| h.as_ref() == **field))
        .map(|field| field.to_string())
        .collect();
    
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// Reads only the header row.
pub fn read_headers<R: Read>(reader: R) -> ReportResult<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    
    let record = csv_reader
        .headers()
        .map_err(|e| ReportError::InvalidCsv(e.to_string()))?;
    
    let headers: Vec<String> = record
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReportError::InvalidCsv("no header row found".to_string()));
    }
    
    debug!("Parsed {} CSV headers", headers.len());
    Ok(headers)
}

pub fn validate_csv<R: Read>(reader: R) -> ReportResult<HeaderCheck> {
    let headers = read_headers(reader)?;
    validate_headers(&headers, &REQUIRED_FIELDS).map_err(ReportError::MissingHeaders)?;
    
    let optional_present: Vec<String> = OPTIONAL_FIELDS
        .iter()
        .filter(|field| headers.iter().any(|h| h.as_str() == **field))
        .map(|field| field.to_string())
        .collect();
    
    if !optional_present.is_empty() {
        info!("Optional fields present: {}", optional_present.join(", "));
    }
    
    Ok(HeaderCheck { headers, optional_present })
}

pub fn validate_csv_file<P: AsRef<Path>>(path: P) -> ReportResult<HeaderCheck> {
    let file = std::fs::File::open(path)?;
    validate_csv(file)
}

pub fn is_csv_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    
    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
