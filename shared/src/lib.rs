//! Shared types for the loyalty backend
//!
//! Domain models (members, loyalty counters, external customer records,
//! users) and the unified error system used by the server and its peers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
