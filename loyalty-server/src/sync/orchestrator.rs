//! Full customer sync
//!
//! Pages through the upstream customer API with a cursor, writes every page
//! in chunked atomic batches and paces itself between pages:
//!
//! ```text
//! fetch(limit, last) ──► chunk(chunk_size) ──► commit ──► sleep(page_delay)
//!        ▲  retry transport/status   retry ResourceExhausted only  │
//!        └─────────────────────── cursor = last id ◄───────────────┘
//! ```
//!
//! No checkpoint is kept; a failed run starts over from page one. Every field
//! the sync writes is an absolute upstream value, so replaying is harmless.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use shared::models::CustomerId;

use crate::clock::Clock;
use crate::config::SyncTuning;
use crate::error::SyncError;
use crate::loyalty::ReconciliationEngine;
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::source::{CustomerSource, PageRequest, SourceError};
use crate::store::{StoreError, WriteBatch};

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Non-empty pages fetched
    pub pages: usize,
    /// Batches committed
    pub chunks: usize,
    /// Records written
    pub processed: usize,
    /// Records without an external id
    pub skipped: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sync finished. Total customers synced: {}", self.processed)
    }
}

pub struct SyncOrchestrator {
    source: Arc<dyn CustomerSource>,
    engine: Arc<ReconciliationEngine>,
    clock: Arc<dyn Clock>,
    tuning: SyncTuning,
    running: AtomicBool,
}

/// Clears the running flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn CustomerSource>,
        engine: Arc<ReconciliationEngine>,
        clock: Arc<dyn Clock>,
        tuning: SyncTuning,
    ) -> Self {
        Self {
            source,
            engine,
            clock,
            tuning: tuning.normalized(),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn begin_run(&self) -> Result<RunGuard<'_>, SyncError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::Conflict)?;
        Ok(RunGuard(&self.running))
    }

    /// Pull every upstream customer into the Member Store
    pub async fn run_full_sync(&self) -> Result<SyncSummary, SyncError> {
        let _run = self.begin_run()?;
        let policy = RetryPolicy::from(&self.tuning);
        let clock = self.clock.as_ref();
        let source = self.source.as_ref();
        let store = self.engine.store().as_ref();

        let mut summary = SyncSummary::default();
        let mut cursor: Option<CustomerId> = None;

        tracing::info!(
            page_size = self.tuning.page_size,
            chunk_size = self.tuning.chunk_size,
            max_retries = policy.max_retries,
            "Starting full customer sync"
        );

        loop {
            let request = PageRequest {
                limit: self.tuning.page_size,
                last: cursor.clone(),
            };
            let page_number = summary.pages + 1;

            let request_ref = &request;
            let page = retry_with_backoff(
                &policy,
                clock,
                "Customer page fetch",
                SourceError::is_retryable,
                move || source.fetch_page(request_ref),
            )
            .await
            .map_err(|failure| SyncError::Fatal {
                attempts: failure.attempts,
                processed: summary.processed,
                reason: format!("fetching page {page_number}: {}", failure.error),
            })?;

            if page.is_empty() {
                break;
            }
            summary.pages = page_number;

            for (chunk_index, chunk) in page.chunks(self.tuning.chunk_size).enumerate() {
                let mut batch = WriteBatch::new();
                for record in chunk {
                    match self.engine.member_write(record) {
                        Ok(op) => batch.push(op),
                        Err(e) => {
                            summary.skipped += 1;
                            tracing::warn!(page = page_number, "Skipping customer record: {e}");
                        }
                    }
                }
                if batch.is_empty() {
                    continue;
                }

                let written = batch.len();
                let batch_ref = &batch;
                retry_with_backoff(
                    &policy,
                    clock,
                    "Member batch commit",
                    StoreError::is_retryable,
                    move || store.commit(batch_ref.clone()),
                )
                .await
                .map_err(|failure| SyncError::Fatal {
                    attempts: failure.attempts,
                    processed: summary.processed,
                    reason: format!(
                        "committing chunk {} of page {page_number}: {}",
                        chunk_index + 1,
                        failure.error
                    ),
                })?;

                summary.chunks += 1;
                summary.processed += written;
                tracing::info!(
                    page = page_number,
                    chunk = chunk_index + 1,
                    written,
                    total = summary.processed,
                    "Committed customer chunk"
                );
            }

            let next = page.last().and_then(|record| record.cursor_id()).cloned();
            match next {
                None => {
                    return Err(SyncError::Fatal {
                        attempts: 1,
                        processed: summary.processed,
                        reason: format!("last record of page {page_number} has no id to continue from"),
                    });
                }
                Some(next) if cursor.as_ref() == Some(&next) => {
                    return Err(SyncError::Fatal {
                        attempts: 1,
                        processed: summary.processed,
                        reason: format!("cursor did not advance past {next} on page {page_number}"),
                    });
                }
                Some(next) => cursor = Some(next),
            }

            clock.sleep(self.tuning.page_delay).await;
        }

        tracing::info!(
            pages = summary.pages,
            chunks = summary.chunks,
            processed = summary.processed,
            skipped = summary.skipped,
            "{summary}"
        );
        Ok(summary)
    }
}
