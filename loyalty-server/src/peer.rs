//! Peer loyalty service client
//!
//! The peer exposes the same `POST /api/loyalty/update-stamps` contract this
//! server does (see `api::loyalty`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::models::{Loyalty, StampUpdate, UpdatedLoyaltyResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Peer request failed: {0}")]
    Request(String),

    #[error("Peer returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Peer response could not be decoded: {0}")]
    Decode(String),
}

/// `{ "error": "..." }` as returned on failure
#[derive(Deserialize)]
struct PeerErrorBody {
    error: String,
}

#[async_trait]
pub trait LoyaltyPeer: Send + Sync {
    /// Forward an already applied update; returns the peer's counters
    async fn update_stamps(&self, update: &StampUpdate) -> Result<Loyalty, PeerError>;
}

pub struct HttpLoyaltyPeer {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpLoyaltyPeer {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PeerError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl LoyaltyPeer for HttpLoyaltyPeer {
    async fn update_stamps(&self, update: &StampUpdate) -> Result<Loyalty, PeerError> {
        let mut builder = self.client.post(&self.url).json(update);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PeerError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PeerErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(PeerError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: UpdatedLoyaltyResponse = response
            .json()
            .await
            .map_err(|e| PeerError::Decode(e.to_string()))?;
        Ok(body.updated_loyalty)
    }
}
