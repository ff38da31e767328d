//! loyalty-server - loyalty member sync backend
//!
//! - Pulls customers from the upstream customer API into the Member Store
//!   (paged, chunked, retried with linear backoff)
//! - Applies incremental stamp updates and forwards them to the peer loyalty
//!   service
//! - Serves the cached loyalty customers list and dashboard user auth

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod loyalty;
pub mod peer;
pub mod retry;
pub mod source;
pub mod state;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::SyncError;
pub use state::{AppState, Collaborators};
