use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use contracts::system::tasks::{TaskInfo, TaskRunResponse};

use crate::shared::data::db::AppState;
use crate::shared::error::{AppError, AppResult};
use crate::system::auth::context::RequestContext;
use crate::system::tasks::{initialization, service};

/// GET /api/admin/tasks
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TaskInfo>>> {
    let registry = initialization::build_registry(&state)?;
    Ok(Json(registry.list(Utc::now())))
}

/// POST /api/admin/tasks/:name/run
pub async fn run(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(name): Path<String>,
) -> AppResult<Json<TaskRunResponse>> {
    let registry = initialization::build_registry(&state)?;
    if registry.get(&name).is_none() {
        return Err(AppError::not_found(format!("Unknown task '{}'", name)));
    }
    tracing::info!("Task {} started manually by {}", name, ctx.username);
    let result = service::run_task(&state, &registry, initialization::task_logger(&state), &name).await?;
    Ok(Json(result))
}

/// GET /api/admin/tasks/runs/:session_id/log
pub async fn run_log(State(state): State<AppState>, Path(session_id): Path<String>) -> AppResult<String> {
    initialization::task_logger(&state)
        .read_log(&session_id)?
        .ok_or_else(|| AppError::not_found("Task log not found"))
}
