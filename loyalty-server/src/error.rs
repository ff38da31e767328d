//! Sync and reconciliation errors

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::source::SourceError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad input; never retried
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    TransientStore(#[from] StoreError),

    #[error(transparent)]
    TransientNetwork(#[from] SourceError),

    /// Retries exhausted or a non-retryable failure mid-run
    #[error("Sync aborted after {attempts} attempt(s) with {processed} customers synced: {reason}")]
    Fatal {
        attempts: u32,
        processed: usize,
        reason: String,
    },

    #[error("A sync is already in progress")]
    Conflict,
}

impl SyncError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SyncError::Validation(msg.into())
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        let message = err.to_string();
        match err {
            SyncError::Validation(_) => AppError::validation(message),
            SyncError::TransientStore(StoreError::ResourceExhausted(_)) => {
                AppError::with_message(ErrorCode::StoreExhausted, message)
            }
            SyncError::TransientStore(StoreError::InvalidArgument(_)) => {
                AppError::with_message(ErrorCode::InvalidRequest, message)
            }
            SyncError::TransientStore(_) => AppError::database(message),
            SyncError::TransientNetwork(_) => {
                AppError::with_message(ErrorCode::SourceUnavailable, message)
            }
            SyncError::Fatal {
                attempts,
                processed,
                ..
            } => AppError::with_message(ErrorCode::SyncFailed, message)
                .with_detail("attempts", attempts)
                .with_detail("processed", processed),
            SyncError::Conflict => AppError::new(ErrorCode::SyncInProgress),
        }
    }
}
