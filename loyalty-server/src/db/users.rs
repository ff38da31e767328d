//! Dashboard user repository

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{User, normalize_email};
use thiserror::Error;

use crate::store::{StoreError, StoreResult};

/// key = user id, value = JSON-serialized User
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// key = normalised email, value = user id
const USERS_BY_EMAIL_TABLE: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already registered")]
    AlreadyExists,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Create a user; the email must not be registered yet
    pub fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserError> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email: normalize_email(email),
            password_hash: password_hash.to_string(),
            created_at: shared::util::now_millis(),
        };

        if !self.insert_if_email_free(&user)? {
            return Err(UserError::AlreadyExists);
        }

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Insert `user` unless its email is taken, within one transaction
    fn insert_if_email_free(&self, user: &User) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL_TABLE)?;
            if by_email.get(user.email.as_str())?.is_some() {
                return Ok(false);
            }
            by_email.insert(user.email.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS_TABLE)?;
            let bytes = serde_json::to_vec(user)?;
            users.insert(user.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let by_email = read_txn.open_table(USERS_BY_EMAIL_TABLE)?;
        let Some(id) = by_email.get(email.as_str())?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS_TABLE)?;
        match users.get(id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Err(StoreError::Backend(format!(
                "email index points at missing user {id}"
            ))),
        }
    }

    /// All users, oldest first
    pub fn list(&self) -> StoreResult<Vec<User>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS_TABLE)?;

        let mut all = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            all.push(serde_json::from_slice::<User>(value.value())?);
        }
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}
