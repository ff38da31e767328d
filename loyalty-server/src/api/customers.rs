//! Loyalty customers list
//!
//! GET /api                      - alias of the route below
//! GET /api/loyalty-customers    - members with stamps, most first (cached)

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use shared::error::{AppError, AppResult};
use shared::models::LoyaltyCustomer;

use crate::loyalty::load_loyalty_customers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api", get(list_loyalty_customers))
        .route("/api/loyalty-customers", get(list_loyalty_customers))
}

pub async fn list_loyalty_customers(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LoyaltyCustomer>>> {
    if let Some(cached) = state.loyalty_cache.get().await {
        tracing::debug!(count = cached.len(), "Serving loyalty customers from cache");
        return Ok(Json(cached.as_ref().clone()));
    }

    let generation = state.loyalty_cache.generation().await;
    let customers = load_loyalty_customers(state.store.as_ref(), state.loyalty_list_page_size)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let customers = Arc::new(customers);
    if state
        .loyalty_cache
        .put_if_current(generation, customers.clone())
        .await
    {
        tracing::info!(count = customers.len(), "Loyalty customers cached");
    } else {
        tracing::debug!("Loyalty customers changed during load, not caching");
    }
    Ok(Json(customers.as_ref().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::state::Collaborators;
    use crate::store::{
        Document, MemberStore, RangeQuery, RedbMemberStore, StoreResult, StoredMember, WriteBatch,
    };
    use async_trait::async_trait;
    use shared::models::MemberKey;
    use tokio::sync::Notify;

    /// Holds every range query until released
    struct HeldStore {
        inner: RedbMemberStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl MemberStore for HeldStore {
        async fn get(&self, key: &MemberKey) -> StoreResult<Option<Document>> {
            self.inner.get(key).await
        }

        async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
            self.inner.commit(batch).await
        }

        async fn query_range(&self, query: &RangeQuery) -> StoreResult<Vec<StoredMember>> {
            let result = self.inner.query_range(query).await;
            self.entered.notify_one();
            self.release.notified().await;
            result
        }
    }

    #[tokio::test]
    async fn list_read_before_invalidation_is_not_cached() {
        let mut state = AppState::in_memory(
            &Config::for_tests(),
            Collaborators {
                source: None,
                peer: None,
                clock: Arc::new(ManualClock::default()),
            },
        )
        .unwrap();
        let held = Arc::new(HeldStore {
            inner: RedbMemberStore::open_in_memory().unwrap(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        state.store = held.clone();

        let load = tokio::spawn(list_loyalty_customers(State(state.clone())));
        held.entered.notified().await;

        // A sync lands while the list is being read
        state.loyalty_cache.invalidate().await;
        held.release.notify_one();

        let Json(served) = load.await.unwrap().unwrap();
        assert!(served.is_empty());
        assert!(state.loyalty_cache.get().await.is_none());
    }
}
