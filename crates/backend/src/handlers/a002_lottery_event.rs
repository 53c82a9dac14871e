use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a002_lottery_event::{
    AddLevelValueDto, EventSummary, LevelTree, LotteryEvent, LotteryEventDto, SetLevelsDto,
};
use serde_json::json;

use crate::domain::a002_lottery_event::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;

/// Event of the caller's community; every nested lottery route goes through it
pub(crate) async fn load_event(state: &AppState, ctx: &RequestContext, id: &str) -> AppResult<LotteryEvent> {
    service::get_for_community(&state.db, ctx, id).await
}

/// GET /api/lottery/events
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<Vec<LotteryEvent>>> {
    Ok(Json(service::list(&state.db, &ctx).await?))
}

/// POST /api/lottery/events
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<LotteryEventDto>,
) -> AppResult<Json<serde_json::Value>> {
    let name = dto.name.clone();
    let id = service::create(&state.db, &ctx, dto).await?;
    logger::log(
        &state.db,
        "lottery",
        &format!("Event '{}' created by {}", name.trim(), ctx.username),
    );
    Ok(Json(json!({ "id": id })))
}

/// GET /api/lottery/events/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<LotteryEvent>> {
    Ok(Json(load_event(&state, &ctx, &id).await?))
}

/// PUT /api/lottery/events/:id
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<LotteryEventDto>,
) -> AppResult<StatusCode> {
    service::update(&state.db, &ctx, &id, dto).await?;
    Ok(StatusCode::OK)
}

/// GET /api/lottery/events/:id/summary
pub async fn summary(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<EventSummary>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::summary(&state.db, &event).await?))
}

/// GET /api/lottery/events/:id/levels
pub async fn get_levels(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<LevelTree>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::get_level_tree(&state.db, &event.to_string_id()).await?))
}

/// PUT /api/lottery/events/:id/levels
pub async fn set_levels(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<SetLevelsDto>,
) -> AppResult<Json<LevelTree>> {
    let event_id = load_event(&state, &ctx, &id).await?.to_string_id();
    service::set_level_names(&state.db, &event_id, dto).await?;
    Ok(Json(service::get_level_tree(&state.db, &event_id).await?))
}

/// POST /api/lottery/events/:id/levels/values
pub async fn add_level_value(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<AddLevelValueDto>,
) -> AppResult<Json<serde_json::Value>> {
    let event_id = load_event(&state, &ctx, &id).await?.to_string_id();
    let value_id = service::add_level_value(&state.db, &event_id, dto).await?;
    Ok(Json(json!({ "id": value_id })))
}

/// DELETE /api/lottery/events/:id/levels/values/:value_id
pub async fn delete_level_value(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, value_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let event_id = load_event(&state, &ctx, &id).await?.to_string_id();
    let deleted = service::delete_level_value(&state.db, &event_id, &value_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
