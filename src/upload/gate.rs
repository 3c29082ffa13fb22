//! Single-flight state machine around one CSV selection.
//!
//! ```text
//! Empty -> Selected -> Validating -> Rejected
//!                                 -> Submitting -> Succeeded -> Empty (after reset delay)
//!                                               -> Failed
//! ```
//! `Rejected` and `Failed` keep the file so it can be resubmitted.

use super::client::{CsvUpload, PredictionService};
use super::headers::{format_file_size, is_csv_filename, validate_csv};
use crate::error::{ReportError, ReportResult};
use crate::records::{AnalysisSnapshot, PredictionPayload};
use log::{error, info, warn};
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Empty,
    Selected,
    Validating,
    Rejected,
    Submitting,
    Succeeded,
    Failed,
}

impl UploadState {
    /// File changes are refused while a check or request is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Validating | UploadState::Submitting)
    }
}

pub struct UploadGate {
    state: UploadState,
    file: Option<CsvUpload>,
    snapshot: Option<AnalysisSnapshot>,
    last_error: Option<String>,
    succeeded_at: Option<Instant>,
    reset_delay: Duration,
}

impl UploadGate {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            state: UploadState::Empty,
            file: None,
            snapshot: None,
            last_error: None,
            succeeded_at: None,
            reset_delay,
        }
    }
    
    pub fn state(&self) -> UploadState {
        self.state
    }
    
    pub fn selected_file(&self) -> Option<&CsvUpload> {
        self.file.as_ref()
    }
    
    /// Data from the most recent successful submission.
    pub fn snapshot(&self) -> Option<&AnalysisSnapshot> {
        self.snapshot.as_ref()
    }
    
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
    
    pub fn select(&mut self, upload: CsvUpload) -> ReportResult<()> {
        if self.state.is_busy() {
            return Err(ReportError::Gate(
                "cannot change file while a submission is in progress".to_string()
            ));
        }
        if !is_csv_filename(&upload.file_name) {
            return Err(ReportError::Gate(
                format!("only CSV files are supported: {}", upload.file_name)
            ));
        }
        
        info!("Selected {} ({})", upload.file_name, format_file_size(upload.size()));
        self.file = Some(upload);
        self.state = UploadState::Selected;
        self.last_error = None;
        self.succeeded_at = None;
        Ok(())
    }
    
    pub fn select_path<P: AsRef<Path>>(&mut self, path: P) -> ReportResult<()> {
        let upload = CsvUpload::from_path(path)?;
        self.select(upload)
    }
    
    pub fn clear(&mut self) -> ReportResult<()> {
        if self.state.is_busy() {
            return Err(ReportError::Gate(
                "cannot remove file while a submission is in progress".to_string()
            ));
        }
        self.file = None;
        self.state = UploadState::Empty;
        self.succeeded_at = None;
        Ok(())
    }
    
    /// Validates the selected file and, if it passes, moves to `Submitting`.
    ///
    /// The returned upload must be settled with [`complete_submission`](Self::complete_submission).
    pub fn begin_submission(&mut self) -> ReportResult<CsvUpload> {
        if self.state.is_busy() {
            warn!("Submission ignored: another submission is in flight");
            return Err(ReportError::Gate("a submission is already in flight".to_string()));
        }
        let upload = match (&self.file, self.state) {
            (Some(file), UploadState::Selected | UploadState::Rejected | UploadState::Failed) => file.clone(),
            _ => return Err(ReportError::Gate("no file selected".to_string())),
        };
        
        self.state = UploadState::Validating;
        match validate_csv(upload.bytes.as_slice()) {
            Ok(_) => {
                info!("CSV validated successfully");
                self.state = UploadState::Submitting;
                Ok(upload)
            }
            Err(e) => {
                warn!("{}", e);
                self.state = UploadState::Rejected;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
    
    /// Settles the in-flight submission. Earlier data is only replaced on success.
    pub fn complete_submission(
        &mut self,
        outcome: ReportResult<PredictionPayload>,
        now: Instant,
    ) -> ReportResult<&AnalysisSnapshot> {
        if self.state != UploadState::Submitting {
            return Err(ReportError::Gate("no submission in flight".to_string()));
        }
        
        match outcome {
            Ok(payload) => {
                info!("File submitted successfully");
                self.state = UploadState::Succeeded;
                self.succeeded_at = Some(now);
                self.last_error = None;
                Ok(&*self.snapshot.insert(payload.into_snapshot()))
            }
            Err(e) => {
                error!("Error submitting file: {}", e);
                self.state = UploadState::Failed;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
    
    pub fn submit(&mut self, service: &dyn PredictionService) -> ReportResult<&AnalysisSnapshot> {
        let upload = self.begin_submission()?;
        let outcome = service.predict(&upload);
        self.complete_submission(outcome, Instant::now())
    }
    
    /// Clears a finished selection once the reset delay has passed.
    pub fn poll(&mut self, now: Instant) -> UploadState {
        if let (UploadState::Succeeded, Some(at)) = (self.state, self.succeeded_at) {
            if now.saturating_duration_since(at) >= self.reset_delay {
                self.state = UploadState::Empty;
                self.file = None;
                self.succeeded_at = None;
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{PatientRecord, RoiRecord};
    use crate::upload::headers::REQUIRED_FIELDS;
    use std::cell::Cell;
    
    struct MockService {
        calls: Cell<usize>,
        fail: bool,
    }
    
    impl MockService {
        fn new(fail: bool) -> Self {
            Self { calls: Cell::new(0), fail }
        }
    }
    
    impl PredictionService for MockService {
        fn predict(&self, _upload: &CsvUpload) -> ReportResult<PredictionPayload> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ReportError::Service { status: 500, message: "boom".to_string() });
            }
            Ok(PredictionPayload {
                predictions: vec![PatientRecord {
                    patient_id: Some("P1".to_string()),
                    ..PatientRecord::default()
                }],
                roi_report: vec![RoiRecord::default()],
                ..PredictionPayload::default()
            })
        }
    }
    
    fn valid_upload() -> CsvUpload {
        CsvUpload::new("patients.csv", format!("{}\n", REQUIRED_FIELDS.join(",")).into_bytes())
    }
    
    fn upload_missing_sp_chf() -> CsvUpload {
        let header: Vec<&str> = REQUIRED_FIELDS.iter().copied().filter(|f| *f != "SP_CHF").collect();
        CsvUpload::new("patients.csv", format!("{}\n", header.join(",")).into_bytes())
    }
    
    #[test]
    fn test_successful_submission() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        let service = MockService::new(false);
        gate.select(valid_upload()).unwrap();
        
        let snapshot = gate.submit(&service).unwrap();
        assert_eq!(snapshot.predictions.len(), 1);
        assert_eq!(gate.state(), UploadState::Succeeded);
        assert_eq!(service.calls.get(), 1);
    }
    
    #[test]
    fn test_second_submission_while_submitting_is_rejected() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        gate.select(valid_upload()).unwrap();
        
        gate.begin_submission().unwrap();
        assert_eq!(gate.state(), UploadState::Submitting);
        
        assert!(matches!(gate.begin_submission(), Err(ReportError::Gate(_))));
        assert!(gate.select(valid_upload()).is_err());
        assert!(gate.clear().is_err());
        assert_eq!(gate.state(), UploadState::Submitting);
    }
    
    #[test]
    fn test_invalid_headers_never_reach_service() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        let service = MockService::new(false);
        gate.select(upload_missing_sp_chf()).unwrap();
        
        match gate.submit(&service) {
            Err(ReportError::MissingHeaders(missing)) => assert_eq!(missing, vec!["SP_CHF"]),
            other => panic!("expected missing headers, got {:?}", other.map(|s| s.clone())),
        }
        assert_eq!(gate.state(), UploadState::Rejected);
        assert_eq!(service.calls.get(), 0);
        assert!(gate.selected_file().is_some());
        
        // a corrected file can be selected after rejection
        gate.select(valid_upload()).unwrap();
        assert_eq!(gate.state(), UploadState::Selected);
    }
    
    #[test]
    fn test_failure_keeps_previous_snapshot() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        gate.select(valid_upload()).unwrap();
        gate.submit(&MockService::new(false)).unwrap();
        
        gate.select(valid_upload()).unwrap();
        assert!(gate.submit(&MockService::new(true)).is_err());
        assert_eq!(gate.state(), UploadState::Failed);
        assert!(gate.last_error().unwrap().contains("500"));
        assert_eq!(gate.snapshot().unwrap().predictions.len(), 1);
        
        // resubmitting from Failed is allowed
        assert!(gate.submit(&MockService::new(false)).is_ok());
    }
    
    #[test]
    fn test_reset_after_delay() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        gate.select(valid_upload()).unwrap();
        gate.begin_submission().unwrap();
        
        let start = Instant::now();
        gate.complete_submission(Ok(PredictionPayload::default()), start).unwrap();
        
        assert_eq!(gate.poll(start + Duration::from_secs(1)), UploadState::Succeeded);
        assert_eq!(gate.poll(start + Duration::from_secs(3)), UploadState::Empty);
        assert!(gate.selected_file().is_none());
        assert!(gate.snapshot().is_some());
    }
    
    #[test]
    fn test_submit_without_file() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        assert!(matches!(gate.begin_submission(), Err(ReportError::Gate(_))));
        assert!(gate.complete_submission(Ok(PredictionPayload::default()), Instant::now()).is_err());
        assert_eq!(gate.state(), UploadState::Empty);
    }
    
    #[test]
    fn test_non_csv_selection_refused() {
        let mut gate = UploadGate::new(Duration::from_secs(3));
        assert!(gate.select(CsvUpload::new("patients.xlsx", Vec::new())).is_err());
        assert_eq!(gate.state(), UploadState::Empty);
    }
}
