//! External customer records (upstream customer API)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// External customer id
///
/// The upstream API sends ids either as JSON strings or numbers; both are
/// normalised to their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Parse a non-empty id (surrounding whitespace is trimmed)
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => CustomerId(s.trim().to_string()),
            RawId::Unsigned(n) => CustomerId(n.to_string()),
            RawId::Signed(n) => CustomerId(n.to_string()),
        })
    }
}

/// One customer record as returned by the upstream customer API
///
/// Every field decodes leniently: a value of an unexpected type reads as
/// absent instead of failing the record, so one odd field never stalls a sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCustomer {
    /// Source-side record id, used as the pagination cursor when present
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<CustomerId>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_spent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub orders_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub accepts_marketing: Option<bool>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub default_address: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub addresses: Option<Vec<Value>>,
    #[serde(default)]
    pub last_order: Option<Value>,
    /// Loyalty snapshot as held by the upstream system
    #[serde(default)]
    pub loyalty: Option<Value>,
}

impl ExternalCustomer {
    /// The external id this record is stored under, if non-empty
    pub fn external_id(&self) -> Option<&CustomerId> {
        self.customer_id.as_ref().filter(|id| !id.is_empty())
    }

    /// The id to request the next page after this record
    pub fn cursor_id(&self) -> Option<&CustomerId> {
        self.id
            .as_ref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.external_id())
    }
}

/// A page of customers; the body is either `{ "data": [...] }` or a bare array
///
/// Records stay raw until [`CustomerPage::into_records`] so that a single
/// malformed entry cannot reject the page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CustomerPage {
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

impl CustomerPage {
    /// Decode each record; an entry that is not an object becomes an empty
    /// record, which has no id and is skipped downstream.
    pub fn into_records(self) -> Vec<ExternalCustomer> {
        let raw = match self {
            CustomerPage::Wrapped { data } => data,
            CustomerPage::Bare(records) => records,
        };
        raw.into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::warn!(index, "Undecodable customer record: {e}");
                    ExternalCustomer::default()
                })
            })
            .collect()
    }
}

fn id_from_value(value: &Value) -> Option<CustomerId> {
    match value {
        Value::String(s) => Some(CustomerId(s.trim().to_string())),
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.to_string())
            .or_else(|| n.as_i64().map(|v| v.to_string()))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| format!("{f:.0}"))
            })
            .map(CustomerId),
        _ => None,
    }
}

/// Accepts `"42"`, `42` or `42.0`; anything else reads as absent
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CustomerId>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(id_from_value))
}

/// Accepts strings, and numbers or booleans in their text form
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Accepts `true`, `"true"`, `1` and their negative forms
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_u64().map(|v| v != 0),
        _ => None,
    })
}

/// Accepts a list, or a single object as a one-element list
fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(items),
        Some(object @ Value::Object(_)) => Some(vec![object]),
        _ => None,
    })
}

/// Accepts `12.5`, `"12.50"` or `null`
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts `3`, `"3"` or `null`
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts `["vip", "local"]` or the comma separated form `"vip, local"`
fn lenient_tags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(s)) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_id_accepts_strings_and_numbers() {
        let id: CustomerId = serde_json::from_value(json!(7381230911_i64)).unwrap();
        assert_eq!(id.as_str(), "7381230911");

        let id: CustomerId = serde_json::from_value(json!(" 42 ")).unwrap();
        assert_eq!(id.as_str(), "42");

        assert!(CustomerId::parse("   ").is_none());
    }

    #[test]
    fn record_parses_upstream_shape() {
        let record: ExternalCustomer = serde_json::from_value(json!({
            "id": 9,
            "customerId": 123,
            "firstName": "Ana",
            "totalSpent": "250.75",
            "ordersCount": 4,
            "acceptsMarketing": true,
            "tags": "vip, local",
            "loyalty": {"stamps": 1, "count": 2}
        }))
        .unwrap();

        assert_eq!(record.external_id().unwrap().as_str(), "123");
        assert_eq!(record.cursor_id().unwrap().as_str(), "9");
        assert_eq!(record.total_spent, Some(250.75));
        assert_eq!(record.orders_count, Some(4));
        assert_eq!(
            record.tags,
            Some(vec!["vip".to_string(), "local".to_string()])
        );
        assert!(record.addresses.is_none());
    }

    #[test]
    fn cursor_falls_back_to_customer_id() {
        let record: ExternalCustomer =
            serde_json::from_value(json!({"customerId": "55"})).unwrap();
        assert_eq!(record.cursor_id().unwrap().as_str(), "55");
    }

    #[test]
    fn page_accepts_wrapped_and_bare_bodies() {
        let wrapped: CustomerPage =
            serde_json::from_value(json!({"data": [{"customerId": 1}]})).unwrap();
        assert_eq!(wrapped.into_records().len(), 1);

        let bare: CustomerPage =
            serde_json::from_value(json!([{"customerId": 1}, {"customerId": 2}])).unwrap();
        assert_eq!(bare.into_records().len(), 2);
    }

    #[test]
    fn mistyped_fields_read_as_absent_or_coerced() {
        let record: ExternalCustomer = serde_json::from_value(json!({
            "id": 2.0,
            "customerId": 2,
            "firstName": {"given": "Ana"},
            "phone": 5551234,
            "email": null,
            "acceptsMarketing": "yes",
            "ordersCount": "many",
            "addresses": {"city": "Lisbon"},
            "tags": 7
        }))
        .unwrap();

        assert_eq!(record.cursor_id().unwrap().as_str(), "2");
        assert_eq!(record.external_id().unwrap().as_str(), "2");
        assert_eq!(record.first_name, None);
        assert_eq!(record.phone.as_deref(), Some("5551234"));
        assert_eq!(record.accepts_marketing, Some(true));
        assert_eq!(record.orders_count, None);
        assert_eq!(record.addresses, Some(vec![json!({"city": "Lisbon"})]));
        assert_eq!(record.tags, None);
    }

    #[test]
    fn mistyped_ids_read_as_absent() {
        let record: ExternalCustomer =
            serde_json::from_value(json!({"id": true, "customerId": [1]})).unwrap();
        assert!(record.external_id().is_none());
        assert!(record.cursor_id().is_none());
    }

    #[test]
    fn non_object_entry_does_not_reject_the_page() {
        let page: CustomerPage = serde_json::from_value(json!([
            {"id": 1, "customerId": 1, "email": "a@example.com"},
            "garbage",
            {"id": 3, "customerId": 3, "phone": 5551234}
        ]))
        .unwrap();

        let records = page.into_records();
        assert_eq!(records.len(), 3);
        assert!(records[1].external_id().is_none());
        assert_eq!(records[2].phone.as_deref(), Some("5551234"));
    }
}
