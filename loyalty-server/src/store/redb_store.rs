//! redb-backed Member Store
//!
//! Documents are stored JSON-encoded under their member key. A
//! [`WriteBatch`] maps onto one write transaction, so a failed batch leaves
//! nothing behind.

use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::MemberKey;

use super::{
    Document, MemberStore, RangeQuery, StoreResult, StoredMember, WriteBatch, field_number,
};
use crate::db;

/// key = member key, value = JSON-serialized document
const MEMBERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("members");

#[derive(Clone)]
pub struct RedbMemberStore {
    db: Arc<Database>,
}

impl RedbMemberStore {
    /// Use an already opened database, creating the members table if needed
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(MEMBERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Store backed by an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::new(db::open_in_memory()?)
    }

    /// Number of stored members
    pub fn len(&self) -> StoreResult<u64> {
        use redb::ReadableTableMetadata;

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMBERS_TABLE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl MemberStore for RedbMemberStore {
    async fn get(&self, key: &MemberKey) -> StoreResult<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMBERS_TABLE)?;
        match table.get(key.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        batch.check_limit()?;
        if batch.is_empty() {
            return Ok(());
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MEMBERS_TABLE)?;
            for op in batch.ops() {
                let current: Option<Document> = match table.get(op.key.as_str())? {
                    Some(guard) => Some(serde_json::from_slice(guard.value())?),
                    None => None,
                };
                let next = op.apply_to(current);
                let bytes = serde_json::to_vec(&next)?;
                table.insert(op.key.as_str(), bytes.as_slice())?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(writes = batch.len(), "Committed member batch");
        Ok(())
    }

    /// Full scan of the members table; fine for the member counts this
    /// service handles, but not an index.
    async fn query_range(&self, query: &RangeQuery) -> StoreResult<Vec<StoredMember>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMBERS_TABLE)?;

        let mut rows: Vec<(f64, StoredMember)> = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let document: Document = serde_json::from_slice(value.value())?;
            let Some(number) = field_number(&document, &query.field) else {
                continue;
            };
            if number <= query.greater_than {
                continue;
            }
            let key = MemberKey::from_stored(key.value());
            if let Some(cursor) = &query.start_after
                && query.compare((number, &key), (cursor.value, &cursor.key))
                    != std::cmp::Ordering::Greater
            {
                continue;
            }
            rows.push((number, StoredMember { key, document }));
        }

        rows.sort_by(|a, b| query.compare((a.0, &a.1.key), (b.0, &b.1.key)));
        rows.truncate(query.limit);
        Ok(rows.into_iter().map(|(_, member)| member).collect())
    }
}
