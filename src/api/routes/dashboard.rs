//! Dashboard Route
//!
//! - GET /api/v1/dashboard/:username - Recent vitals and alerts for one user

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::DashboardResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/dashboard/:username
///
/// Both lists are newest first and capped by the API config.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<Json<DashboardResponse>> {
    let user = state
        .db
        .find_user(&username)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let vitals = state.db.recent_vitals(user.id, state.config.dashboard_vitals)?;
    let alerts = state.db.recent_alerts(user.id, state.config.dashboard_alerts)?;

    Ok(Json(DashboardResponse {
        user: user.full_name,
        vitals: vitals.into_iter().map(Into::into).collect(),
        alerts: alerts.into_iter().map(Into::into).collect(),
    }))
}
