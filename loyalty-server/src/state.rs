//! Application state shared by every handler

use std::sync::Arc;
use std::time::Duration;

use redb::Database;
use shared::models::LoyaltyCustomer;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::{self, users::UserStore};
use crate::loyalty::{EngineOptions, ReconciliationEngine};
use crate::peer::{HttpLoyaltyPeer, LoyaltyPeer};
use crate::source::{CustomerSource, HttpCustomerSource};
use crate::store::{MemberStore, RedbMemberStore, StoreResult};
use crate::sync::SyncOrchestrator;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    /// Member documents
    pub store: Arc<dyn MemberStore>,
    /// Dashboard accounts
    pub users: UserStore,
    pub engine: Arc<ReconciliationEngine>,
    /// `None` when no customer source is configured
    pub sync: Option<Arc<SyncOrchestrator>>,
    /// `None` when no peer is configured or propagation is off
    pub peer: Option<Arc<dyn LoyaltyPeer>>,
    pub clock: Arc<dyn Clock>,
    pub loyalty_cache: TtlCache<Arc<Vec<LoyaltyCustomer>>>,
    pub loyalty_list_page_size: usize,
    pub stamp_update_throttle: Duration,
    /// JWT secret for dashboard users
    pub jwt_secret: String,
}

/// External collaborators, injectable for tests
pub struct Collaborators {
    pub source: Option<Arc<dyn CustomerSource>>,
    pub peer: Option<Arc<dyn LoyaltyPeer>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Open the database and build HTTP clients from configuration
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = db::open(&config.database_path)?;
        tracing::info!(path = %config.database_path, "Database opened");

        let source: Option<Arc<dyn CustomerSource>> = match &config.customer_source_url {
            Some(url) => Some(Arc::new(HttpCustomerSource::new(
                url.clone(),
                config.customer_source_token.clone(),
            )?)),
            None => {
                tracing::warn!("CUSTOMER_SOURCE_URL not set, full sync is disabled");
                None
            }
        };

        let peer: Option<Arc<dyn LoyaltyPeer>> = match &config.loyalty_peer_url {
            Some(url) if config.propagate_to_peer => Some(Arc::new(HttpLoyaltyPeer::new(
                url.clone(),
                config.loyalty_peer_token.clone(),
            )?)),
            Some(_) => {
                tracing::info!("Peer propagation disabled by PROPAGATE_TO_PEER");
                None
            }
            None => None,
        };

        Ok(Self::with_database(
            config,
            db,
            Collaborators {
                source,
                peer,
                clock: Arc::new(SystemClock),
            },
        )?)
    }

    /// Build state over an opened database and the given collaborators
    pub fn with_database(
        config: &Config,
        db: Arc<Database>,
        collaborators: Collaborators,
    ) -> StoreResult<Self> {
        let Collaborators {
            source,
            peer,
            clock,
        } = collaborators;

        let store: Arc<dyn MemberStore> = Arc::new(RedbMemberStore::new(db.clone())?);
        let users = UserStore::new(db)?;
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            clock.clone(),
            EngineOptions {
                key_prefix: config.member_key_prefix.clone(),
                write_mode: config.write_mode,
            },
        ));
        let sync = source.map(|source| {
            Arc::new(SyncOrchestrator::new(
                source,
                engine.clone(),
                clock.clone(),
                config.sync,
            ))
        });
        let peer = peer.filter(|_| config.propagate_to_peer);

        Ok(Self {
            store,
            users,
            engine,
            sync,
            peer,
            loyalty_cache: TtlCache::new(clock.clone(), config.loyalty_cache_ttl),
            clock,
            loyalty_list_page_size: config.loyalty_list_page_size,
            stamp_update_throttle: config.stamp_update_throttle,
            jwt_secret: config.jwt_secret.clone(),
        })
    }

    /// In-memory state for tests and embedding
    pub fn in_memory(config: &Config, collaborators: Collaborators) -> StoreResult<Self> {
        Self::with_database(config, db::open_in_memory()?, collaborators)
    }
}
