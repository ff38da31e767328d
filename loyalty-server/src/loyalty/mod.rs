//! Loyalty domain: stamp reconciliation and the loyalty customers list

pub mod engine;
pub mod key_lock;
pub mod listing;

pub use engine::{EngineOptions, ReconciliationEngine};
pub use key_lock::KeyedLocks;
pub use listing::load_loyalty_customers;
