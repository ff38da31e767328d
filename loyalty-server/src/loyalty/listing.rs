//! Loyalty customers list: every member holding at least one stamp, most
//! stamps first.

use shared::models::LoyaltyCustomer;

use crate::store::{MemberStore, RangeQuery, SortOrder, StoreResult};

const STAMPS_FIELD: &str = "loyalty.stamps";

/// Page through the store until a short page comes back
pub async fn load_loyalty_customers(
    store: &dyn MemberStore,
    page_size: usize,
) -> StoreResult<Vec<LoyaltyCustomer>> {
    let page_size = page_size.max(1);
    let mut customers = Vec::new();
    let mut cursor = None;

    loop {
        let query = RangeQuery::new(STAMPS_FIELD, 0.0)
            .order(SortOrder::Desc)
            .limit(page_size)
            .start_after(cursor.take());
        let page = store.query_range(&query).await?;
        let fetched = page.len();

        cursor = page.last().and_then(|m| m.cursor(STAMPS_FIELD));
        customers.extend(page.into_iter().map(|m| LoyaltyCustomer {
            id: m.key,
            document: m.document,
        }));

        if fetched < page_size || cursor.is_none() {
            break;
        }
    }

    tracing::debug!(count = customers.len(), "Loaded loyalty customers");
    Ok(customers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RedbMemberStore, WriteBatch, WriteOp};
    use serde_json::json;
    use shared::models::MemberKey;

    async fn seeded(stamps: &[u64]) -> RedbMemberStore {
        let store = RedbMemberStore::open_in_memory().unwrap();
        let batch: WriteBatch = stamps
            .iter()
            .enumerate()
            .map(|(i, s)| {
                WriteOp::merge(
                    MemberKey::from_stored(format!("DC-{i}")),
                    json!({"loyalty": {"stamps": s, "count": 0}})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
            })
            .collect();
        store.commit(batch).await.unwrap();
        store
    }

    #[tokio::test]
    async fn only_members_with_stamps_in_descending_order() {
        let store = seeded(&[0, 5, 2, 9, 0, 2]).await;

        let list = load_loyalty_customers(&store, 500).await.unwrap();
        let stamps: Vec<_> = list
            .iter()
            .map(|c| c.document["loyalty"]["stamps"].as_u64().unwrap())
            .collect();
        assert_eq!(stamps, vec![9, 5, 2, 2]);
    }

    #[tokio::test]
    async fn pages_until_a_short_page() {
        let stamps: Vec<u64> = (1..=7).collect();
        let store = seeded(&stamps).await;

        let list = load_loyalty_customers(&store, 3).await.unwrap();
        assert_eq!(list.len(), 7);
        assert_eq!(list[0].id.as_str(), "DC-6");
        assert_eq!(list[6].id.as_str(), "DC-0");
    }
}
