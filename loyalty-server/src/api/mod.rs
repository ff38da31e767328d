//! HTTP API
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/health` | - |
//! | GET | `/api`, `/api/loyalty-customers` | - |
//! | POST | `/api/auth/register`, `/api/auth/login` | - |
//! | GET | `/api/auth/users` | Bearer JWT |
//! | GET | `/api/sync` | - |
//! | POST | `/api/sync/update-stamps-for-members` | - |
//! | POST | `/api/loyalty/update-stamps` | - |

pub mod auth;
pub mod customers;
pub mod health;
pub mod loyalty;
pub mod sync;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Request body limit (large stamp batches)
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(customers::router())
        .merge(auth::router(state))
        .merge(sync::router())
        .merge(loyalty::router())
}

/// Build the fully configured application
pub fn create_router(state: AppState) -> Router {
    build_router(&state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
