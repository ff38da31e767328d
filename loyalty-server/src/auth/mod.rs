//! Dashboard user authentication

pub mod jwt;
pub mod password;

pub use jwt::{UserIdentity, create_token, require_user, verify_token};
pub use password::{hash_password, verify_password};
