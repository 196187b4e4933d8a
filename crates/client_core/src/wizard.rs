//! Wizard controller: a fixed six-step flow accumulating one submission.
//! Forward navigation is gated on per-step validity; the terminal step hands
//! the aggregated payload to a verification backend.

use chrono::Utc;
use thiserror::Error;

use shared::{
    domain::{
        ApiProvider, CertificateMetadata, CertificateType, FileMeta, Identity, Role, SubmissionId,
        VerificationMode,
    },
    error::{RejectReason, RejectedUpload, ACCEPTED_FORMATS, MAX_FILE_SIZE_BYTES},
    protocol::{
        BulkUploadPayload, ProgressEvent, SubmissionPayload, VerificationReport, VerificationStage,
    },
};

pub const STEP_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CertificateType,
    FileUpload,
    Metadata,
    BulkOptions,
    VerificationMode,
    Submit,
}

impl Step {
    pub const ALL: [Step; STEP_COUNT] = [
        Step::CertificateType,
        Step::FileUpload,
        Step::Metadata,
        Step::BulkOptions,
        Step::VerificationMode,
        Step::Submit,
    ];

    /// 1-based position in the flow.
    pub fn index(self) -> usize {
        match self {
            Step::CertificateType => 1,
            Step::FileUpload => 2,
            Step::Metadata => 3,
            Step::BulkOptions => 4,
            Step::VerificationMode => 5,
            Step::Submit => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<Step> {
        (1..=STEP_COUNT)
            .contains(&index)
            .then(|| Step::ALL[index - 1])
    }

    fn next(self) -> Option<Step> {
        Step::from_index(self.index() + 1)
    }

    fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).and_then(Step::from_index)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::CertificateType => "Certificate Type",
            Step::FileUpload => "Upload File",
            Step::Metadata => "Enter Details",
            Step::BulkOptions => "Bulk Options",
            Step::VerificationMode => "Verification",
            Step::Submit => "Submit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::CertificateType => "Select document type",
            Step::FileUpload => "Add your certificate",
            Step::Metadata => "Provide metadata",
            Step::BulkOptions => "Multiple certificates",
            Step::VerificationMode => "Choose verification mode",
            Step::Submit => "Process verification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("step '{title}' is incomplete", title = .0.title())]
    StepIncomplete(Step),
    #[error("already at the final step")]
    AtFinalStep,
    #[error("bulk processing is not available for this role")]
    BulkNotPermitted,
    #[error("bulk processing is disabled")]
    BulkDisabled,
    #[error("submission is only possible from the final step")]
    NotAtSubmitStep,
    #[error("a submission is already being processed")]
    AlreadyProcessing,
}

/// Bulk step slice. Disabling clears the files and the provider selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOptions {
    pub enabled: bool,
    pub files: Vec<FileMeta>,
    pub api_connection: Option<ApiProvider>,
}

/// Result of one upload batch. Rejections never block the accepted files of
/// the same batch.
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    pub accepted: usize,
    pub rejected: Vec<RejectedUpload>,
}

/// Screens a single file against the accepted extension set and the size cap.
pub fn validate_file(file: &FileMeta) -> Result<(), RejectReason> {
    let extension = file.extension();
    if !ACCEPTED_FORMATS.contains(&extension.as_str()) {
        return Err(RejectReason::UnsupportedType { extension });
    }
    if file.size_bytes > MAX_FILE_SIZE_BYTES {
        return Err(RejectReason::TooLarge {
            size_bytes: file.size_bytes,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    certificate_type: Option<CertificateType>,
    files: Vec<FileMeta>,
    metadata: CertificateMetadata,
    bulk: BulkOptions,
    verification_mode: VerificationMode,
    bulk_allowed: bool,
    processing: bool,
    progress: u8,
    stage: Option<VerificationStage>,
    last_report: Option<VerificationReport>,
}

impl Wizard {
    /// Fresh wizard at step 1. The role decides whether the bulk step offers
    /// anything beyond skipping ahead.
    pub fn new(role: Role) -> Self {
        Self {
            step: Step::CertificateType,
            certificate_type: None,
            files: Vec::new(),
            metadata: CertificateMetadata::default(),
            bulk: BulkOptions::default(),
            verification_mode: VerificationMode::default(),
            bulk_allowed: role.can_bulk_upload(),
            processing: false,
            progress: 0,
            stage: None,
            last_report: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn certificate_type(&self) -> Option<&CertificateType> {
        self.certificate_type.as_ref()
    }

    pub fn files(&self) -> &[FileMeta] {
        &self.files
    }

    pub fn metadata(&self) -> &CertificateMetadata {
        &self.metadata
    }

    pub fn bulk(&self) -> &BulkOptions {
        &self.bulk
    }

    pub fn verification_mode(&self) -> VerificationMode {
        self.verification_mode
    }

    pub fn bulk_allowed(&self) -> bool {
        self.bulk_allowed
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn stage(&self) -> Option<VerificationStage> {
        self.stage
    }

    pub fn last_report(&self) -> Option<&VerificationReport> {
        self.last_report.as_ref()
    }

    pub fn step_valid(&self, step: Step) -> bool {
        match step {
            Step::CertificateType => self.certificate_type.is_some(),
            Step::FileUpload => !self.files.is_empty(),
            Step::Metadata => self.metadata.required_complete(),
            // Optional step.
            Step::BulkOptions => true,
            // The mode defaults to online, so this always holds.
            Step::VerificationMode => true,
            Step::Submit => true,
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.step_valid(self.step)
    }

    /// Advances one step. The cursor never moves when the current step's
    /// validity predicate fails or the flow is already at the final step.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        let Some(next) = self.step.next() else {
            return Err(WizardError::AtFinalStep);
        };
        if !self.can_proceed() {
            return Err(WizardError::StepIncomplete(self.step));
        }
        self.step = next;
        Ok(self.step)
    }

    /// Steps back, saturating at the first step.
    pub fn previous(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn set_certificate_type(&mut self, certificate_type: CertificateType) {
        self.certificate_type = Some(certificate_type);
    }

    /// Validates each file of the batch individually; valid files are kept
    /// even when siblings are rejected.
    pub fn add_files(&mut self, batch: Vec<FileMeta>) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();
        for file in batch {
            match validate_file(&file) {
                Ok(()) => {
                    self.files.push(file);
                    outcome.accepted += 1;
                }
                Err(reason) => outcome.rejected.push(RejectedUpload { file, reason }),
            }
        }
        outcome
    }

    pub fn remove_file(&mut self, index: usize) -> Option<FileMeta> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn set_metadata(&mut self, metadata: CertificateMetadata) {
        self.metadata = metadata;
    }

    pub fn set_verification_mode(&mut self, mode: VerificationMode) {
        self.verification_mode = mode;
    }

    pub fn set_bulk_enabled(&mut self, enabled: bool) -> Result<(), WizardError> {
        if enabled && !self.bulk_allowed {
            return Err(WizardError::BulkNotPermitted);
        }
        self.bulk.enabled = enabled;
        if !enabled {
            self.bulk.files.clear();
            self.bulk.api_connection = None;
        }
        Ok(())
    }

    /// Bulk spreadsheets are forwarded to the provider unscreened; only the
    /// per-certificate upload step applies the extension and size rules.
    pub fn add_bulk_files(&mut self, batch: Vec<FileMeta>) -> Result<usize, WizardError> {
        if !self.bulk.enabled {
            return Err(WizardError::BulkDisabled);
        }
        let added = batch.len();
        self.bulk.files.extend(batch);
        Ok(added)
    }

    pub fn set_api_connection(&mut self, provider: Option<ApiProvider>) -> Result<(), WizardError> {
        if !self.bulk.enabled {
            return Err(WizardError::BulkDisabled);
        }
        self.bulk.api_connection = provider;
        Ok(())
    }

    /// Aggregates every step into a submission payload and enters the
    /// processing state. Only callable from the final step.
    pub fn submit(&mut self, identity: &Identity) -> Result<SubmissionPayload, WizardError> {
        if self.step != Step::Submit {
            return Err(WizardError::NotAtSubmitStep);
        }
        if self.processing {
            return Err(WizardError::AlreadyProcessing);
        }
        let Some(certificate_type) = self.certificate_type.clone() else {
            return Err(WizardError::StepIncomplete(Step::CertificateType));
        };

        self.processing = true;
        self.progress = 0;
        self.stage = Some(VerificationStage::Analyzing);

        Ok(SubmissionPayload {
            submission_id: SubmissionId::generate(),
            submitted_by: identity.email.clone(),
            submitted_as: identity.role,
            certificate_type,
            files: self.files.clone(),
            metadata: self.metadata.clone(),
            bulk: BulkUploadPayload {
                enabled: self.bulk.enabled,
                files: self.bulk.files.clone(),
                api_connection: self.bulk.api_connection,
            },
            verification_mode: self.verification_mode,
            submitted_at: Utc::now(),
        })
    }

    /// Mirrors a backend progress event into the presentation state. Ignored
    /// while idle.
    pub fn record_progress(&mut self, event: ProgressEvent) {
        if !self.processing {
            return;
        }
        self.progress = event.percent.min(100);
        self.stage = Some(event.stage);
    }

    /// Terminal transition back to idle, keeping the report for display.
    pub fn complete(&mut self, report: VerificationReport) {
        self.processing = false;
        self.last_report = Some(report);
    }

    /// Drops back to idle without a report when the backend errors out.
    pub fn reset_processing(&mut self) {
        self.processing = false;
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
