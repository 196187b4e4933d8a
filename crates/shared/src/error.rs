use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FileMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

/// Error shape of the verification backend contract. The simulated backend
/// returns it too, so a real service slots in without call-site changes.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Upper-cased extensions accepted by the upload step.
pub const ACCEPTED_FORMATS: [&str; 5] = ["JPG", "PNG", "PDF", "XML", "JSON"];

/// 10 MiB per-file cap.
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("File type .{extension} is not supported. Accepted formats: JPG, PNG, PDF, XML, JSON")]
    UnsupportedType { extension: String },
    #[error("File size exceeds 10MB limit. Current size: {mb:.1}MB", mb = *size_bytes as f64 / (1024.0 * 1024.0))]
    TooLarge { size_bytes: u64 },
}

/// A file refused by the upload step. Rejections are reported per file and
/// never block the accepted files of the same batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedUpload {
    pub file: FileMeta,
    pub reason: RejectReason,
}

impl fmt::Display for RejectedUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.name, self.reason)
    }
}
