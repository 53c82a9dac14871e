use axum::{
    extract::{Path, State},
    Json,
};
use contracts::domain::a006_commission_setting::{CommissionSetting, SaveCommissionSettingsDto};
use contracts::projections::p900_commission_earned::{
    CommissionReport, CommissionSyncResult, ResetCommissionsDto,
};
use serde_json::json;

use super::a002_lottery_event::load_event;
use crate::domain::a006_commission_setting::service;
use crate::projections::p900_commission_earned::service as commission_service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;

/// GET /api/lottery/events/:id/commission-settings
pub async fn get(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CommissionSetting>>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::get(&state.db, &event.to_string_id()).await?))
}

/// PUT /api/lottery/events/:id/commission-settings
pub async fn save(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<SaveCommissionSettingsDto>,
) -> AppResult<Json<CommissionSyncResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    let result = service::save(&state.db, &event.to_string_id(), dto).await?;
    logger::log(
        &state.db,
        "commission",
        &format!("Commission settings of {} saved by {}", event.base.code, ctx.username),
    );
    Ok(Json(result))
}

/// GET /api/lottery/events/:id/commissions
pub async fn report(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<CommissionReport>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(commission_service::report(&state.db, &event.to_string_id()).await?))
}

/// POST /api/lottery/events/:id/commissions/sync
pub async fn sync(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<CommissionSyncResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(commission_service::sync_event(&state.db, &event.to_string_id()).await?))
}

/// POST /api/lottery/events/:id/commissions/reset
pub async fn reset(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<ResetCommissionsDto>,
) -> AppResult<Json<serde_json::Value>> {
    let event = load_event(&state, &ctx, &id).await?;
    let deleted = commission_service::reset(&state.db, &event.to_string_id(), dto).await?;
    logger::warn(
        &state.db,
        "commission",
        &format!("{} commission rows of {} reset by {}", deleted, event.base.code, ctx.username),
    );
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
