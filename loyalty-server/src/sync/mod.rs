//! Sync Orchestrator: full upstream sync and batch stamp updates

pub mod batch;
pub mod orchestrator;

pub use batch::{StampBatchReport, apply_stamp_updates};
pub use orchestrator::{SyncOrchestrator, SyncSummary};
