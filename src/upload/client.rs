use crate::error::{ReportError, ReportResult};
use crate::records::PredictionPayload;
use log::{debug, info};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;

/// A CSV file held in memory for validation and upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
    
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
    
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The remote scorer that turns a CSV into predictions and an ROI report.
pub trait PredictionService {
    fn predict(&self, upload: &CsvUpload) -> ReportResult<PredictionPayload>;
}

pub struct HttpPredictionService {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpPredictionService {
    pub fn new(endpoint: &str) -> ReportResult<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
    
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PredictionService for HttpPredictionService {
    fn predict(&self, upload: &CsvUpload) -> ReportResult<PredictionPayload> {
        info!("Posting {} to {}", upload.file_name, self.endpoint);
        
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);
        
        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        
        let payload = parse_response(status, &body)?;
        debug!(
            "Received {} predictions and {} ROI records",
            payload.predictions.len(),
            payload.roi_report.len()
        );
        Ok(payload)
    }
}

/// Only a 200 whose envelope is not `status: "error"` counts as success.
pub fn parse_response(status: StatusCode, body: &str) -> ReportResult<PredictionPayload> {
    if status != StatusCode::OK {
        return Err(ReportError::Service {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }
    
    let payload: PredictionPayload = serde_json::from_str(body)?;
    if payload.is_error() {
        return Err(ReportError::Service {
            status: status.as_u16(),
            message: payload.message.unwrap_or_else(|| "service reported an error".to_string()),
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    
    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "DESYNPUF_ID,Age").unwrap();
        
        let upload = CsvUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "patients.csv");
        assert_eq!(upload.size(), 16);
    }
    
    #[test]
    fn test_non_ok_status_is_failure() {
        let result = parse_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        match result {
            Err(ReportError::Service { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected service error, got {:?}", other),
        }
        
        // any status other than 200 fails, even a well-formed body
        let body = r#"{"status": "success", "predictions": [], "roiReport": []}"#;
        assert!(matches!(
            parse_response(StatusCode::CREATED, body),
            Err(ReportError::Service { status: 201, .. })
        ));
    }
    
    #[test]
    fn test_error_envelope_is_failure() {
        let result = parse_response(StatusCode::OK, r#"{"status": "error", "message": "x"}"#);
        match result {
            Err(ReportError::Service { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "x");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }
    
    #[test]
    fn test_non_json_body_is_failure() {
        let result = parse_response(StatusCode::OK, "<html>gateway</html>");
        assert!(matches!(result, Err(ReportError::Json(_))));
    }
    
    #[test]
    fn test_successful_response() {
        let body = r#"{
            "status": "success",
            "predictions": [{"patientId": "P1", "age": 45}],
            "roiReport": [{"patientId": "P1", "predictedCosts": []}]
        }"#;
        let payload = parse_response(StatusCode::OK, body).unwrap();
        assert_eq!(payload.predictions.len(), 1);
        assert_eq!(payload.roi_report.len(), 1);
    }
}
