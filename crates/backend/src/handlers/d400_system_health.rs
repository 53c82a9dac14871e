use axum::{extract::State, Json};
use contracts::dashboards::d400_system_health::SystemHealth;

use crate::dashboards::d400_system_health::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;

/// GET /api/admin/system-health
pub async fn get(State(state): State<AppState>) -> AppResult<Json<SystemHealth>> {
    Ok(Json(service::collect(&state.db, &state.config).await?))
}
