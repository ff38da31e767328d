//! Member Store
//!
//! Members are JSON documents addressed by [`MemberKey`]. Writers submit
//! [`WriteBatch`]es that the backend applies atomically; readers either fetch
//! one document or page through a numeric range over a document field.

mod redb_store;

pub use redb_store::RedbMemberStore;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::models::MemberKey;
use thiserror::Error;

/// Most writes a single batch may carry
pub const MAX_BATCH_WRITES: usize = 500;

/// A stored member document (always a JSON object)
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Quota, contention or capacity failure; worth retrying after a pause
    #[error("Store resources exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Invalid store request: {0}")]
    InvalidArgument(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Only exhaustion is worth retrying. The redb backend raises it for
    /// full-disk and out-of-memory I/O errors.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::ResourceExhausted(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How a write combines with the stored document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Deep merge: objects merge field by field, anything else is replaced
    #[default]
    Merge,
    /// Overwrite the whole document
    Replace,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(WriteMode::Merge),
            "replace" | "overwrite" => Ok(WriteMode::Replace),
            other => Err(format!("unknown write mode: {other}")),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Merge => f.write_str("merge"),
            WriteMode::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub key: MemberKey,
    pub document: Document,
    pub mode: WriteMode,
}

impl WriteOp {
    pub fn merge(key: MemberKey, document: Document) -> Self {
        Self {
            key,
            document,
            mode: WriteMode::Merge,
        }
    }

    /// Apply this write on top of the current document
    pub fn apply_to(&self, current: Option<Document>) -> Document {
        match (self.mode, current) {
            (WriteMode::Merge, Some(mut existing)) => {
                merge_json(&mut existing, &self.document);
                existing
            }
            _ => self.document.clone(),
        }
    }
}

/// Ordered writes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Reject batches the backend cannot apply in one transaction
    pub fn check_limit(&self) -> StoreResult<()> {
        if self.ops.len() > MAX_BATCH_WRITES {
            return Err(StoreError::InvalidArgument(format!(
                "batch of {} writes exceeds the limit of {MAX_BATCH_WRITES}",
                self.ops.len()
            )));
        }
        Ok(())
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Deep merge `patch` into `target`
pub fn merge_json(target: &mut Document, patch: &Document) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_json(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Position of the last row of the previous page
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCursor {
    pub value: f64,
    pub key: MemberKey,
}

/// Documents whose numeric `field` (dotted path) is greater than
/// `greater_than`, ordered by that value and then by key.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub greater_than: f64,
    pub order: SortOrder,
    pub limit: usize,
    pub start_after: Option<RangeCursor>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>, greater_than: f64) -> Self {
        Self {
            field: field.into(),
            greater_than,
            order: SortOrder::Desc,
            limit: 500,
            start_after: None,
        }
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn start_after(mut self, cursor: Option<RangeCursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Compare two positions in this query's order
    pub fn compare(&self, a: (f64, &MemberKey), b: (f64, &MemberKey)) -> Ordering {
        let natural = a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1));
        match self.order {
            SortOrder::Asc => natural,
            SortOrder::Desc => natural.reverse(),
        }
    }
}

/// A document with its key
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMember {
    pub key: MemberKey,
    pub document: Document,
}

impl StoredMember {
    /// Cursor pointing at this row for `field`
    pub fn cursor(&self, field: &str) -> Option<RangeCursor> {
        field_number(&self.document, field).map(|value| RangeCursor {
            value,
            key: self.key.clone(),
        })
    }
}

/// Numeric value at a dotted path (`loyalty.stamps`)
pub fn field_number(document: &Document, path: &str) -> Option<f64> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    current.as_f64()
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn get(&self, key: &MemberKey) -> StoreResult<Option<Document>>;

    /// Apply every write of the batch or none of them
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    async fn query_range(&self, query: &RangeQuery) -> StoreResult<Vec<StoredMember>>;
}
