//! Batch stamp updates
//!
//! Each entry is applied locally and then forwarded to the peer loyalty
//! service. Bad entries, local failures and peer failures are logged and
//! counted; none of them stop the batch.

use std::time::Duration;

use serde_json::Value;
use shared::models::{StampBatchResponse, StampUpdateRequest};

use crate::clock::Clock;
use crate::error::SyncError;
use crate::loyalty::ReconciliationEngine;
use crate::peer::LoyaltyPeer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StampBatchReport {
    /// Entries applied locally
    pub applied: usize,
    /// Invalid entries and local failures
    pub skipped: usize,
    /// Entries applied locally that the peer did not accept
    pub peer_failures: usize,
}

impl StampBatchReport {
    pub fn message(&self) -> String {
        format!("Updated stamps for {} members.", self.applied)
    }
}

impl From<StampBatchReport> for StampBatchResponse {
    fn from(report: StampBatchReport) -> Self {
        Self {
            message: report.message(),
            applied: report.applied,
            skipped: report.skipped,
            peer_failures: report.peer_failures,
        }
    }
}

/// Apply a batch of `{customerId, additionalStamps}` entries
///
/// `updates` must be a non-empty JSON array. `peer` is `None` when
/// propagation is disabled or no peer is configured.
pub async fn apply_stamp_updates(
    engine: &ReconciliationEngine,
    peer: Option<&dyn LoyaltyPeer>,
    clock: &dyn Clock,
    throttle: Duration,
    updates: &Value,
) -> Result<StampBatchReport, SyncError> {
    let entries = match updates {
        Value::Array(entries) if !entries.is_empty() => entries,
        _ => return Err(SyncError::validation("Array of updates required")),
    };

    let mut report = StampBatchReport::default();
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && !throttle.is_zero() {
            clock.sleep(throttle).await;
        }

        let update = match serde_json::from_value::<StampUpdateRequest>(entry.clone())
            .map_err(|e| e.to_string())
            .and_then(|request| request.validate().map_err(|e| e.to_string()))
        {
            Ok(update) => update,
            Err(reason) => {
                report.skipped += 1;
                tracing::warn!(index, "Skipping invalid stamp update: {reason}");
                continue;
            }
        };

        if let Err(e) = engine
            .apply_incremental_stamps(&update.customer_id, update.additional_stamps)
            .await
        {
            report.skipped += 1;
            tracing::error!(
                index,
                customer_id = %update.customer_id,
                "Failed to apply stamp update: {e}"
            );
            continue;
        }
        report.applied += 1;

        if let Some(peer) = peer
            && let Err(e) = peer.update_stamps(&update).await
        {
            report.peer_failures += 1;
            tracing::warn!(
                customer_id = %update.customer_id,
                "Peer loyalty update failed: {e}"
            );
        }
    }

    tracing::info!(
        applied = report.applied,
        skipped = report.skipped,
        peer_failures = report.peer_failures,
        "{}",
        report.message()
    );
    Ok(report)
}
