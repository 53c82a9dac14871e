use axum::{
    extract::{Query, State},
    Json,
};
use contracts::shared::logger::LogQuery;
use serde_json::json;

use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger::repository;
use crate::system::auth::context::RequestContext;

/// GET /api/logs?level=&category=&limit=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<contracts::shared::logger::LogEntry>>> {
    Ok(Json(repository::list_logs(&state.db, &query).await?))
}

/// DELETE /api/logs
pub async fn clear(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<serde_json::Value>> {
    let deleted = repository::clear_all_logs(&state.db).await?;
    tracing::info!("{} cleared {} log rows", ctx.username, deleted);
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
