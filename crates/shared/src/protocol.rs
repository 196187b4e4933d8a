use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ApiProvider, CertificateMetadata, CertificateType, FileMeta, Role, SubmissionId,
    VerificationMode,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUploadPayload {
    pub enabled: bool,
    pub files: Vec<FileMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_connection: Option<ApiProvider>,
}

/// Aggregate of all wizard steps, handed to the verification backend on
/// submit. This is the contract a real verification service would accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub submission_id: SubmissionId,
    pub submitted_by: String,
    pub submitted_as: Role,
    pub certificate_type: CertificateType,
    pub files: Vec<FileMeta>,
    pub metadata: CertificateMetadata,
    pub bulk: BulkUploadPayload,
    pub verification_mode: VerificationMode,
    pub submitted_at: DateTime<Utc>,
}

/// Processing stages reported while a submission is verified. Each stage
/// activates once progress crosses its threshold and counts as complete
/// when the next one takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
    Analyzing,
    DatabaseVerification,
    BlockchainValidation,
    FinalReport,
}

impl VerificationStage {
    pub const ALL: [VerificationStage; 4] = [
        VerificationStage::Analyzing,
        VerificationStage::DatabaseVerification,
        VerificationStage::BlockchainValidation,
        VerificationStage::FinalReport,
    ];

    /// Progress percentage at which the stage activates.
    pub fn threshold(self) -> u8 {
        match self {
            VerificationStage::Analyzing => 0,
            VerificationStage::DatabaseVerification => 25,
            VerificationStage::BlockchainValidation => 50,
            VerificationStage::FinalReport => 75,
        }
    }

    /// Total mapping from progress to the active stage.
    pub fn for_percent(percent: u8) -> Self {
        match percent {
            0..=24 => VerificationStage::Analyzing,
            25..=49 => VerificationStage::DatabaseVerification,
            50..=74 => VerificationStage::BlockchainValidation,
            _ => VerificationStage::FinalReport,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VerificationStage::Analyzing => "Analyzing Certificate",
            VerificationStage::DatabaseVerification => "Database Verification",
            VerificationStage::BlockchainValidation => "Blockchain Validation",
            VerificationStage::FinalReport => "Final Report",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            VerificationStage::Analyzing => "OCR and structure analysis",
            VerificationStage::DatabaseVerification => "Cross-checking with official records",
            VerificationStage::BlockchainValidation => "Consensus verification",
            VerificationStage::FinalReport => "Generating verification report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub stage: VerificationStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub submission_id: SubmissionId,
    pub outcome: VerificationOutcome,
    pub mode: VerificationMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
