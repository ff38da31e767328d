//! Member Model
//!
//! Members are stored as JSON documents keyed by `"<PREFIX>-<customerId>"`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::customer::{CustomerId, ExternalCustomer};

/// Default member key prefix
pub const DEFAULT_MEMBER_KEY_PREFIX: &str = "DC";

/// Store key of a member document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberKey(String);

impl MemberKey {
    /// Derive the key for an external customer id.
    ///
    /// Ids that already carry the prefix (`DC-123`) are used unchanged.
    pub fn for_customer(prefix: &str, id: &CustomerId) -> Self {
        let raw = id.as_str();
        match raw.strip_prefix(prefix) {
            Some(rest) if rest.starts_with('-') => Self(raw.to_string()),
            _ => Self(format!("{prefix}-{raw}")),
        }
    }

    /// Wrap a key read back from the store
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Member document written by the full sync
///
/// Absent scalar fields are skipped so a merge-write keeps whatever the store
/// already holds; collections default to empty the way the upstream sync
/// always wrote them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDocument {
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_marketing: Option<bool>,
    pub tags: Vec<String>,
    pub default_address: Value,
    pub addresses: Vec<Value>,
    pub last_order: Value,
    pub loyalty: Value,
}

impl MemberDocument {
    /// Build the document for a record that has a non-empty external id
    pub fn from_external(customer_id: CustomerId, record: &ExternalCustomer) -> Self {
        Self {
            customer_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            total_spent: record.total_spent,
            orders_count: record.orders_count,
            accepts_marketing: record.accepts_marketing,
            tags: record.tags.clone().unwrap_or_default(),
            default_address: record
                .default_address
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            addresses: record.addresses.clone().unwrap_or_default(),
            last_order: record
                .last_order
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            loyalty: record
                .loyalty
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

/// Entry of the loyalty customers list: the stored document plus its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyCustomer {
    pub id: MemberKey,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}
