//! Auth Routes
//!
//! - POST /api/v1/auth/login
//! - POST /api/v1/auth/signup
//!
//! Password hashing is CPU-bound, so both handlers run the auth service on
//! the blocking pool.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{LoginRequest, SignupResponse};
use crate::api::error::ApiResult;
use crate::api::extract::JsonBody;
use crate::api::state::AppState;
use crate::auth::{Session, SignupForm};

/// POST /api/v1/auth/login
///
/// Returns the session identity, or 401 on bad credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let auth = state.auth.clone();
    let session =
        tokio::task::spawn_blocking(move || auth.login(&req.username, &req.password)).await??;

    tracing::info!(username = %session.username, role = %session.role, "User logged in");
    Ok(Json(session))
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    JsonBody(form): JsonBody<SignupForm>,
) -> ApiResult<Json<SignupResponse>> {
    let auth = state.auth.clone();
    let user = tokio::task::spawn_blocking(move || auth.signup(&form)).await??;

    Ok(Json(SignupResponse {
        message: "User created successfully".to_string(),
        username: user.username,
    }))
}
