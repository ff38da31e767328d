//! Loyalty update endpoint (the contract peers call)
//!
//! POST /api/loyalty/update-stamps  {customerId, additionalStamps} → {updatedLoyalty}

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use shared::error::AppResult;
use shared::models::{StampUpdateRequest, UpdatedLoyaltyResponse};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/loyalty/update-stamps", post(update_stamps))
}

pub async fn update_stamps(
    State(state): State<AppState>,
    Json(req): Json<StampUpdateRequest>,
) -> AppResult<Json<UpdatedLoyaltyResponse>> {
    let update = req.validate()?;

    let award = state
        .engine
        .apply_incremental_stamps(&update.customer_id, update.additional_stamps)
        .await?;

    if update.additional_stamps > 0 {
        state.loyalty_cache.invalidate().await;
    }

    Ok(Json(UpdatedLoyaltyResponse {
        updated_loyalty: award.loyalty,
    }))
}
