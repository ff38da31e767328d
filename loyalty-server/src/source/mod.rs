//! External customer source (upstream paginated customer API)

mod rest;

pub use rest::HttpCustomerSource;

use async_trait::async_trait;
use shared::models::{CustomerId, ExternalCustomer};
use thiserror::Error;

/// One page request: up to `limit` records after `last`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    /// Cursor; `None` for the first page
    pub last: Option<CustomerId>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Customer source request failed: {0}")]
    Request(String),

    #[error("Customer source returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Customer source response could not be decoded: {0}")]
    Decode(String),
}

impl SourceError {
    /// A body that failed to decode will fail the same way again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SourceError::Decode(_))
    }
}

#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<ExternalCustomer>, SourceError>;
}
