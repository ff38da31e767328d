//! Loyalty Reconciliation Engine
//!
//! Owns every write to a member's `loyalty` record:
//!
//! - incremental stamp updates (`count` carries into `stamps` every
//!   [`STAMP_THRESHOLD`] units), serialized per member key
//! - upserts of upstream customer records, which write absolute values and
//!   are therefore safe to replay
//!
//! Incremental updates are *not* idempotent: delivering the same update twice
//! counts it twice.

use std::sync::Arc;

use serde_json::{Value, json};
use shared::models::{
    CustomerId, ExternalCustomer, Loyalty, MemberDocument, MemberKey, STAMP_THRESHOLD, StampAward,
};

use super::key_lock::KeyedLocks;
use crate::clock::Clock;
use crate::error::SyncError;
use crate::store::{Document, MemberStore, WriteBatch, WriteMode, WriteOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Member key prefix (`DC`)
    pub key_prefix: String,
    /// How upserts combine with stored documents
    pub write_mode: WriteMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            key_prefix: shared::models::DEFAULT_MEMBER_KEY_PREFIX.to_string(),
            write_mode: WriteMode::Merge,
        }
    }
}

pub struct ReconciliationEngine {
    store: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
    options: EngineOptions,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn MemberStore>, clock: Arc<dyn Clock>, options: EngineOptions) -> Self {
        Self {
            store,
            clock,
            locks: KeyedLocks::new(),
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn MemberStore> {
        &self.store
    }

    pub fn member_key(&self, customer_id: &CustomerId) -> MemberKey {
        MemberKey::for_customer(&self.options.key_prefix, customer_id)
    }

    /// Current counters of a member (`{0, 0}` when unknown)
    pub async fn loyalty(&self, customer_id: &CustomerId) -> Result<Loyalty, SyncError> {
        let key = self.member_key(customer_id);
        let document = self.store.get(&key).await?;
        Ok(Loyalty::from_document(
            document.as_ref().and_then(|d| d.get("loyalty")),
        ))
    }

    /// Add `units` sub-units to a member's loyalty record.
    ///
    /// Only `loyalty.stamps`, `loyalty.count` and `updatedAt` are written;
    /// other loyalty fields survive the merge. Zero units is a no-op that
    /// returns the current counters without touching the store.
    pub async fn apply_incremental_stamps(
        &self,
        customer_id: &CustomerId,
        units: u64,
    ) -> Result<StampAward, SyncError> {
        if customer_id.is_empty() {
            return Err(SyncError::validation("customerId is required"));
        }

        let key = self.member_key(customer_id);
        let _guard = self.locks.lock(key.as_str()).await;

        let current = Loyalty::from_document(
            self.store
                .get(&key)
                .await?
                .as_ref()
                .and_then(|d| d.get("loyalty")),
        );

        if units == 0 {
            tracing::debug!(member = %key, "Zero stamp update, nothing to write");
            return Ok(StampAward {
                loyalty: current,
                earned_stamps: 0,
            });
        }

        let award = current.add_units(units).ok_or_else(|| {
            SyncError::validation(format!(
                "additionalStamps {units} would overflow the loyalty counters of {key}"
            ))
        })?;

        let mut patch = Document::new();
        patch.insert(
            "loyalty".into(),
            json!({"stamps": award.loyalty.stamps, "count": award.loyalty.count}),
        );
        patch.insert("updatedAt".into(), Value::from(self.clock.now_millis()));

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::merge(key.clone(), patch));
        self.store.commit(batch).await?;

        tracing::info!(
            member = %key,
            units,
            earned = award.earned_stamps,
            stamps = award.loyalty.stamps,
            count = award.loyalty.count,
            threshold = STAMP_THRESHOLD,
            "Applied stamp update"
        );
        Ok(award)
    }

    /// The store write for one upstream record, without committing it
    pub fn member_write(&self, record: &ExternalCustomer) -> Result<WriteOp, SyncError> {
        let customer_id = record
            .external_id()
            .cloned()
            .ok_or_else(|| SyncError::validation("customer record has no customerId"))?;

        let key = self.member_key(&customer_id);
        let document = match serde_json::to_value(MemberDocument::from_external(customer_id, record))
            .map_err(crate::store::StoreError::from)?
        {
            Value::Object(map) => map,
            other => {
                return Err(SyncError::validation(format!(
                    "member document for {key} is not an object: {other}"
                )));
            }
        };

        Ok(WriteOp {
            key,
            document,
            mode: self.options.write_mode,
        })
    }

    /// Write one upstream record in the configured mode
    pub async fn upsert_member(&self, record: &ExternalCustomer) -> Result<MemberKey, SyncError> {
        let op = self.member_write(record)?;
        let key = op.key.clone();
        let mut batch = WriteBatch::new();
        batch.push(op);
        self.store.commit(batch).await?;
        Ok(key)
    }
}
