//! Dashboard auth API
//!
//! POST /api/auth/register - create a user, returns a token
//! POST /api/auth/login    - exchange credentials for a token
//! GET  /api/auth/users    - list users (Bearer token)

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{AuthResponse, LoginRequest, RegisterRequest, UserSummary, non_empty};

use crate::auth::{create_token, hash_password, require_user, verify_password};
use crate::db::users::UserError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/users", get(list_users))
        .layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(protected)
}

fn missing_fields() -> AppError {
    AppError::with_message(ErrorCode::RequiredField, "Missing fields")
}

fn issue_token(state: &AppState, user_id: &str, email: &str) -> AppResult<AuthResponse> {
    let token = create_token(user_id, email, &state.jwt_secret)
        .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;
    Ok(AuthResponse {
        token,
        user_id: user_id.to_string(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(username), Some(email), Some(password)) = (
        non_empty(&req.username),
        non_empty(&req.email),
        non_empty(&req.password),
    ) else {
        return Err(missing_fields());
    };

    let password_hash = hash_password(password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let user = state
        .users
        .create(username, email, &password_hash)
        .map_err(|e| match e {
            UserError::AlreadyExists => AppError::new(ErrorCode::EmailAlreadyRegistered),
            UserError::Store(e) => AppError::database(e.to_string()),
        })?;

    let response = issue_token(&state, &user.id, &user.email)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (non_empty(&req.email), req.password.as_deref()) else {
        return Err(missing_fields());
    };
    if password.is_empty() {
        return Err(missing_fields());
    }

    let user = state
        .users
        .find_by_email(email)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::invalid_credentials());
    }

    Ok(Json(issue_token(&state, &user.id, &user.email)?))
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserSummary>>> {
    let users = state
        .users
        .list()
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}
