//! Unified error codes for the loyalty backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Loyalty errors
//! - 5xxx: Sync errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they serialize as plain
/// numbers in JSON error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Email already registered
    EmailAlreadyRegistered = 1010,

    // ==================== 4xxx: Loyalty ====================
    /// Stamp count is not a valid non-negative integer
    InvalidStampCount = 4002,
    /// Customer id missing or empty
    CustomerIdRequired = 4003,

    // ==================== 5xxx: Sync ====================
    /// A full sync is already running
    SyncInProgress = 5001,
    /// Sync aborted (retries exhausted or non-retryable failure)
    SyncFailed = 5002,
    /// Upstream customer source unavailable
    SourceUnavailable = 5003,
    /// Member store rejected the write for lack of resources
    StoreExhausted = 5004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "No token provided",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::EmailAlreadyRegistered => "Email already registered",

            // Loyalty
            ErrorCode::InvalidStampCount => "additionalStamps must be a non-negative integer",
            ErrorCode::CustomerIdRequired => "customerId is required",

            // Sync
            ErrorCode::SyncInProgress => "A sync is already running",
            ErrorCode::SyncFailed => "Sync failed",
            ErrorCode::SourceUnavailable => "Customer source unavailable",
            ErrorCode::StoreExhausted => "Member store resources exhausted",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1010 => Ok(ErrorCode::EmailAlreadyRegistered),

            // Loyalty
            4002 => Ok(ErrorCode::InvalidStampCount),
            4003 => Ok(ErrorCode::CustomerIdRequired),

            // Sync
            5001 => Ok(ErrorCode::SyncInProgress),
            5002 => Ok(ErrorCode::SyncFailed),
            5003 => Ok(ErrorCode::SourceUnavailable),
            5004 => Ok(ErrorCode::StoreExhausted),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
