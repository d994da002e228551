//! Alert Routes
//!
//! - POST /api/v1/alerts/:id/resolve - Mark an alert as handled

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AlertDto, ResolveAlertRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::JsonBody;
use crate::api::state::AppState;
use crate::storage::StorageError;

/// POST /api/v1/alerts/:id/resolve
///
/// The alert must belong to the named user; anything else is a 404.
pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<ResolveAlertRequest>,
) -> ApiResult<Json<AlertDto>> {
    let user = state
        .db
        .find_user(req.username.trim())?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let alert = state.db.resolve_alert(user.id, id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::NotFound("Alert not found".to_string()),
        other => other.into(),
    })?;

    tracing::info!(username = %user.username, alert_id = id, "Alert resolved");
    Ok(Json(alert.into()))
}
