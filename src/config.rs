use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{ReportError, ReportResult};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";
pub const DEFAULT_REPORT_FILENAME: &str = "analysis_report.pdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub report_filename: String,
    pub top_risk_factors: usize,
    pub reset_delay_secs: u64,
    pub write_section_csv: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            report_filename: DEFAULT_REPORT_FILENAME.to_string(),
            top_risk_factors: 10,
            reset_delay_secs: 3,
            write_section_csv: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
    
    /// Loads `path` when given, otherwise falls back to defaults.
    pub fn load(path: Option<&Path>) -> ReportResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
    
    pub fn validate(&self) -> ReportResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ReportError::Config(
                "Prediction endpoint must not be empty".to_string()
            ));
        }
        
        if !self.report_filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ReportError::Config(
                format!("Report filename must end in .pdf: {}", self.report_filename)
            ));
        }
        
        if self.top_risk_factors == 0 {
            return Err(ReportError::Config(
                "top_risk_factors must be at least 1".to_string()
            ));
        }
        
        Ok(())
    }
    
    pub fn reset_delay(&self) -> Duration {
        Duration::from_secs(self.reset_delay_secs)
    }
}
