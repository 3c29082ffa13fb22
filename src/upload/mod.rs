//! Upload gate: header validation, the submission state machine and the
//! prediction service seam.

pub mod client;
pub mod gate;
pub mod headers;

pub use client::{CsvUpload, HttpPredictionService, PredictionService};
pub use gate::{UploadGate, UploadState};
pub use headers::{validate_csv, validate_csv_file, validate_headers, HeaderCheck, OPTIONAL_FIELDS, REQUIRED_FIELDS};
