use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    
    #[error("PDF error: {0}")]
    Pdf(String),
    
    #[error("Invalid configuration: {0}")]
    Config(String),
    
    #[error("CSV is missing required fields: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),
    
    #[error("Invalid CSV file format: {0}")]
    InvalidCsv(String),
    
    #[error("Prediction service failed (status {status}): {message}")]
    Service { status: u16, message: String },
    
    #[error("Upload not permitted: {0}")]
    Gate(String),
}

impl ReportError {
    /// Failures the user recovers from by fixing the file.
    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::MissingHeaders(_) | ReportError::InvalidCsv(_))
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
