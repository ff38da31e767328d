//! Sync API
//!
//! GET  /api/sync                             - run a full upstream sync (plain text reply)
//! POST /api/sync/update-stamps-for-members   - batch stamp updates

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{StampBatchRequest, StampBatchResponse};

use crate::state::AppState;
use crate::sync::apply_stamp_updates;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sync", get(run_full_sync))
        .route(
            "/api/sync/update-stamps-for-members",
            post(update_stamps_for_members),
        )
}

/// Runs on its own task so a disconnecting caller does not cancel the sync
pub async fn run_full_sync(State(state): State<AppState>) -> Response {
    let Some(orchestrator) = state.sync.clone() else {
        return text_error(AppError::with_message(
            ErrorCode::SourceUnavailable,
            "Customer source is not configured",
        ));
    };

    let cache = state.loyalty_cache.clone();
    let task = tokio::spawn(async move {
        let result = orchestrator.run_full_sync().await;
        if result.is_ok() {
            cache.invalidate().await;
        }
        result
    });

    match task.await {
        Ok(Ok(summary)) => (StatusCode::OK, summary.to_string()).into_response(),
        Ok(Err(e)) => {
            tracing::error!("Full sync failed: {e}");
            text_error(e.into())
        }
        Err(e) => {
            tracing::error!("Full sync task failed: {e}");
            text_error(AppError::internal("Internal server error."))
        }
    }
}

/// Error reply of the sync trigger: status from the code, message as text
fn text_error(err: AppError) -> Response {
    (err.http_status(), err.message).into_response()
}

pub async fn update_stamps_for_members(
    State(state): State<AppState>,
    Json(req): Json<StampBatchRequest>,
) -> AppResult<Json<StampBatchResponse>> {
    let report = apply_stamp_updates(
        &state.engine,
        state.peer.as_deref(),
        state.clock.as_ref(),
        state.stamp_update_throttle,
        &req.updates,
    )
    .await?;

    if report.applied > 0 {
        state.loyalty_cache.invalidate().await;
    }

    Ok(Json(report.into()))
}
