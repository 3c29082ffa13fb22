//! Upload, aggregation and reporting for patient risk predictions.
//!
//! A CSV is checked for the required columns, posted to the prediction
//! service, and the response is reduced into dashboard views and a
//! tabular PDF report.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod output;
pub mod records;
pub mod report;
pub mod upload;

pub use error::{ReportError, ReportResult};
