//! Embedded database
//!
//! One redb file holds every table:
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `members` | member key (`DC-123`) | JSON document | Member Store |
//! | `users` | user id | JSON `User` | Dashboard accounts |
//! | `users_by_email` | normalised email | user id | Email uniqueness index |

pub mod users;

use std::io;
use std::path::Path;
use std::sync::Arc;

use redb::Database;

use crate::store::{StoreError, StoreResult};

/// Open or create the database file, creating parent directories as needed
pub fn open(path: impl AsRef<Path>) -> StoreResult<Arc<Database>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Backend(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }
    let db = Database::create(path)?;
    Ok(Arc::new(db))
}

/// Open a database that lives only in memory
pub fn open_in_memory() -> StoreResult<Arc<Database>> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    Ok(Arc::new(db))
}

/// Out of disk or memory: the write may succeed once space frees up
fn is_exhaustion(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::StorageFull | io::ErrorKind::OutOfMemory)
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        match &e {
            redb::StorageError::Io(io) if is_exhaustion(io.kind()) => {
                StoreError::ResourceExhausted(format!("Storage exhausted: {e}"))
            }
            _ => StoreError::Backend(format!("Storage error: {e}")),
        }
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        match e {
            redb::DatabaseError::Storage(storage) => storage.into(),
            other => StoreError::Backend(format!("Database error: {other}")),
        }
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        match e {
            redb::TransactionError::Storage(storage) => storage.into(),
            other => StoreError::Backend(format!("Transaction error: {other}")),
        }
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        match e {
            redb::TableError::Storage(storage) => storage.into(),
            other => StoreError::Backend(format!("Table error: {other}")),
        }
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        match e {
            redb::CommitError::Storage(storage) => storage.into(),
            other => StoreError::Backend(format!("Commit error: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("loyalty.redb");

        open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn full_disk_is_resource_exhaustion() {
        let full = || redb::StorageError::Io(io::Error::from(io::ErrorKind::StorageFull));

        let err = StoreError::from(full());
        assert!(matches!(err, StoreError::ResourceExhausted(_)));
        assert!(err.is_retryable());

        let err = StoreError::from(redb::CommitError::Storage(full()));
        assert!(err.is_retryable());

        let err = StoreError::from(redb::StorageError::Io(io::Error::from(
            io::ErrorKind::OutOfMemory,
        )));
        assert!(err.is_retryable());
    }

    #[test]
    fn other_io_failures_are_not_retryable() {
        let err = StoreError::from(redb::StorageError::Io(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )));
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_retryable());
    }
}
