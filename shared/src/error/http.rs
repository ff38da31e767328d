//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 409 Conflict
            Self::SyncInProgress => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SourceUnavailable | Self::StoreExhausted => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::SyncFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation, duplicate registration)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::EmailAlreadyRegistered
            | Self::InvalidStampCount
            | Self::CustomerIdRequired => StatusCode::BAD_REQUEST,
        }
    }
}
