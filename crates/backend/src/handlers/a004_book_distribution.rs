use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a004_book_distribution::{AssignBookDto, BookDistribution, ReturnBookDto};

use super::a002_lottery_event::load_event;
use crate::domain::a004_book_distribution::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::system::auth::context::RequestContext;

/// PUT /api/lottery/events/:id/distributions/:dist_id
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
    Json(dto): Json<AssignBookDto>,
) -> AppResult<Json<BookDistribution>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::update(&state.db, &event, &dist_id, dto).await?))
}

/// DELETE /api/lottery/events/:id/distributions/:dist_id
pub async fn unassign(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let event = load_event(&state, &ctx, &id).await?;
    service::unassign(&state.db, &event, &dist_id).await?;
    Ok(StatusCode::OK)
}

/// POST /api/lottery/events/:id/distributions/:dist_id/return
pub async fn set_returned(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
    Json(dto): Json<ReturnBookDto>,
) -> AppResult<Json<BookDistribution>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::set_returned(&state.db, &event, &dist_id, dto).await?))
}
