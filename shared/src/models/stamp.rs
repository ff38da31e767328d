//! Stamp update requests and responses

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::customer::CustomerId;
use super::loyalty::Loyalty;
use crate::error::{AppError, ErrorCode};

/// Raw stamp update as sent by callers
///
/// `additionalStamps` is kept as a raw JSON value so that strings, negatives
/// and fractions can be rejected with a precise validation error. The legacy
/// field name `newStamps` is accepted as an alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampUpdateRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default, alias = "newStamps")]
    pub additional_stamps: Option<Value>,
}

/// A validated stamp update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampUpdate {
    pub customer_id: CustomerId,
    pub additional_stamps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampValidationError {
    #[error("customerId is required")]
    MissingCustomerId,
    #[error("additionalStamps is required")]
    MissingStamps,
    #[error("additionalStamps must be a non-negative integer, got {0}")]
    InvalidStamps(String),
}

impl StampUpdateRequest {
    pub fn validate(&self) -> Result<StampUpdate, StampValidationError> {
        let customer_id = self
            .customer_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or(StampValidationError::MissingCustomerId)?;

        let raw = self
            .additional_stamps
            .as_ref()
            .filter(|v| !v.is_null())
            .ok_or(StampValidationError::MissingStamps)?;

        let additional_stamps = raw
            .as_u64()
            .ok_or_else(|| StampValidationError::InvalidStamps(raw.to_string()))?;

        Ok(StampUpdate {
            customer_id,
            additional_stamps,
        })
    }
}

impl From<StampValidationError> for AppError {
    fn from(err: StampValidationError) -> Self {
        let code = match err {
            StampValidationError::MissingCustomerId => ErrorCode::CustomerIdRequired,
            StampValidationError::MissingStamps | StampValidationError::InvalidStamps(_) => {
                ErrorCode::InvalidStampCount
            }
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Body of `POST /sync/update-stamps-for-members`
///
/// `updates` stays untyped until validated so a non-array is a 400, not a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StampBatchRequest {
    #[serde(default)]
    pub updates: Value,
}

/// `200` body of the peer update endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedLoyaltyResponse {
    pub updated_loyalty: Loyalty,
}

/// `200` body of the batch update endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampBatchResponse {
    pub message: String,
    pub applied: usize,
    pub skipped: usize,
    pub peer_failures: usize,
}
