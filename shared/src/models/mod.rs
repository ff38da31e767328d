//! Data models
//!
//! Shared between the loyalty server, its peer instances and API clients.
//! Wire and storage field names are camelCase.

pub mod customer;
pub mod loyalty;
pub mod member;
pub mod stamp;
pub mod user;

// Re-exports
pub use customer::*;
pub use loyalty::*;
pub use member::*;
pub use stamp::*;
pub use user::*;
