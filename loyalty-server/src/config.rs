//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | ENVIRONMENT | development | development \| staging \| production |
//! | HTTP_PORT | 8001 | HTTP listen port |
//! | DATABASE_PATH | data/loyalty.redb | redb database file |
//! | JWT_SECRET | (dev only) | token signing secret |
//! | CUSTOMER_SOURCE_URL | - | upstream customer list endpoint |
//! | CUSTOMER_SOURCE_TOKEN | - | bearer credential for the upstream API |
//! | LOYALTY_PEER_URL | - | peer `update-stamps` endpoint |
//! | LOYALTY_PEER_TOKEN | - | bearer credential for the peer |
//! | PROPAGATE_TO_PEER | true | forward stamp updates to the peer |
//! | MEMBER_WRITE_MODE | merge | merge \| replace |
//! | MEMBER_KEY_PREFIX | DC | member key prefix |
//! | SYNC_PAGE_SIZE | 250 | records per upstream page |
//! | SYNC_CHUNK_SIZE | 50 | records per store batch |
//! | SYNC_MAX_RETRIES | 5 | retries per fetch/commit |
//! | SYNC_BACKOFF_BASE_MS | 2000 | linear backoff step |
//! | SYNC_PAGE_DELAY_MS | 1500 | pacing delay between pages |
//! | STAMP_UPDATE_THROTTLE_MS | 50 | delay between batch stamp updates |
//! | LOYALTY_CACHE_TTL_SECS | 86400 | loyalty list cache lifetime |
//! | LOYALTY_LIST_PAGE_SIZE | 500 | store page size for the loyalty list |
//! | LOG_LEVEL | info | default log level |
//! | LOG_DIR | - | daily rolling log directory |

use std::str::FromStr;
use std::time::Duration;

use shared::models::DEFAULT_MEMBER_KEY_PREFIX;

use crate::store::{MAX_BATCH_WRITES, WriteMode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// redb database file
    pub database_path: String,
    /// JWT secret for dashboard users
    pub jwt_secret: String,
    /// Upstream customer list endpoint
    pub customer_source_url: Option<String>,
    /// Bearer credential for the upstream API
    pub customer_source_token: Option<String>,
    /// Peer loyalty service `update-stamps` endpoint
    pub loyalty_peer_url: Option<String>,
    /// Bearer credential for the peer
    pub loyalty_peer_token: Option<String>,
    /// Forward batch stamp updates to the peer
    pub propagate_to_peer: bool,
    /// How synced records are written
    pub write_mode: WriteMode,
    /// Member key prefix (`DC` → `DC-<customerId>`)
    pub member_key_prefix: String,
    /// Sync tuning
    pub sync: SyncTuning,
    /// Delay between entries of a batch stamp update
    pub stamp_update_throttle: Duration,
    /// Loyalty customers cache lifetime
    pub loyalty_cache_ttl: Duration,
    /// Store page size when building the loyalty customers list
    pub loyalty_list_page_size: usize,
    /// Default log level
    pub log_level: String,
    /// Daily rolling log directory
    pub log_dir: Option<String>,
}

/// Recognized sync options: page size, chunk size, retries, backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTuning {
    pub page_size: usize,
    pub chunk_size: usize,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub page_delay: Duration,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            page_size: 250,
            chunk_size: 50,
            max_retries: 5,
            backoff_base: Duration::from_millis(2000),
            page_delay: Duration::from_millis(1500),
        }
    }
}

impl SyncTuning {
    /// Clamp sizes into ranges the store and source accept
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.chunk_size = self.chunk_size.clamp(1, MAX_BATCH_WRITES);
        self
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let defaults = SyncTuning::default();

        let write_mode = match std::env::var("MEMBER_WRITE_MODE") {
            Ok(raw) => raw.parse::<WriteMode>()?,
            Err(_) => WriteMode::Merge,
        };

        Ok(Self {
            http_port: parse_env("HTTP_PORT", 8001),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/loyalty.redb".into()),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            customer_source_url: optional_env("CUSTOMER_SOURCE_URL"),
            customer_source_token: optional_env("CUSTOMER_SOURCE_TOKEN"),
            loyalty_peer_url: optional_env("LOYALTY_PEER_URL"),
            loyalty_peer_token: optional_env("LOYALTY_PEER_TOKEN"),
            propagate_to_peer: parse_env("PROPAGATE_TO_PEER", true),
            write_mode,
            member_key_prefix: std::env::var("MEMBER_KEY_PREFIX")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MEMBER_KEY_PREFIX.into()),
            sync: SyncTuning {
                page_size: parse_env("SYNC_PAGE_SIZE", defaults.page_size),
                chunk_size: parse_env("SYNC_CHUNK_SIZE", defaults.chunk_size),
                max_retries: parse_env("SYNC_MAX_RETRIES", defaults.max_retries),
                backoff_base: Duration::from_millis(parse_env("SYNC_BACKOFF_BASE_MS", 2000)),
                page_delay: Duration::from_millis(parse_env("SYNC_PAGE_DELAY_MS", 1500)),
            }
            .normalized(),
            stamp_update_throttle: Duration::from_millis(parse_env(
                "STAMP_UPDATE_THROTTLE_MS",
                50,
            )),
            loyalty_cache_ttl: Duration::from_secs(parse_env(
                "LOYALTY_CACHE_TTL_SECS",
                24 * 60 * 60,
            )),
            loyalty_list_page_size: parse_env("LOYALTY_LIST_PAGE_SIZE", 500usize).max(1),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: optional_env("LOG_DIR"),
            environment,
        })
    }

    /// Configuration for tests and embedded use: in-process defaults, no
    /// upstream or peer configured.
    pub fn for_tests() -> Self {
        Self {
            environment: "development".into(),
            http_port: 0,
            database_path: String::new(),
            jwt_secret: "test-secret".into(),
            customer_source_url: None,
            customer_source_token: None,
            loyalty_peer_url: None,
            loyalty_peer_token: None,
            propagate_to_peer: true,
            write_mode: WriteMode::Merge,
            member_key_prefix: DEFAULT_MEMBER_KEY_PREFIX.into(),
            sync: SyncTuning::default(),
            stamp_update_throttle: Duration::from_millis(50),
            loyalty_cache_ttl: Duration::from_secs(24 * 60 * 60),
            loyalty_list_page_size: 500,
            log_level: "debug".into(),
            log_dir: None,
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_is_clamped() {
        let tuning = SyncTuning {
            page_size: 0,
            chunk_size: 10_000,
            ..SyncTuning::default()
        }
        .normalized();

        assert_eq!(tuning.page_size, 1);
        assert_eq!(tuning.chunk_size, MAX_BATCH_WRITES);

        let tuning = SyncTuning {
            chunk_size: 0,
            ..SyncTuning::default()
        }
        .normalized();
        assert_eq!(tuning.chunk_size, 1);
    }

    #[test]
    fn default_tuning_matches_canonical_sync() {
        let tuning = SyncTuning::default();
        assert_eq!(tuning.page_size, 250);
        assert_eq!(tuning.chunk_size, 50);
        assert_eq!(tuning.max_retries, 5);
        assert_eq!(tuning.backoff_base, Duration::from_millis(2000));
        assert_eq!(tuning.page_delay, Duration::from_millis(1500));
    }

    #[test]
    fn secrets_fall_back_only_in_development() {
        let name = "LOYALTY_TEST_SECRET_THAT_IS_NEVER_SET";
        assert!(Config::require_secret(name, "development").is_ok());
        assert!(Config::require_secret(name, "production").is_err());
    }
}
