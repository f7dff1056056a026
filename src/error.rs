//! Application-level errors.

use thiserror::Error;

use crate::camera::CameraError;
use crate::codec::EncodeError;
use crate::config::ConfigError;
use crate::format::BarcodeFormat;
use crate::permissions::PermissionError;

/// Everything a command can fail with.
///
/// A decode miss is not here: it is [`DecodeOutcome::NotFound`](crate::codec::DecodeOutcome).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    PermissionDenied(PermissionError),

    #[error("Could not encode as {format}: {reason}")]
    EncodeFailed {
        format: BarcodeFormat,
        reason: String,
        guidance: Option<&'static str>,
    },

    #[error("Camera failed to start: {0}")]
    CameraInitFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AppError {
    /// Whether retrying after user action can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::PermissionDenied(_) | AppError::CameraInitFailed(_)
        )
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        let guidance = err.guidance();
        match err {
            EncodeError::EmptyInput => AppError::EncodeFailed {
                format: BarcodeFormat::default(),
                reason: "input is empty".to_string(),
                guidance,
            },
            EncodeError::Unencodable { format, reason } => AppError::EncodeFailed {
                format,
                reason,
                guidance,
            },
        }
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => {
                AppError::PermissionDenied(PermissionError { details: None })
            }
            other => AppError::CameraInitFailed(other.to_string()),
        }
    }
}
