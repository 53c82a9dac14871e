use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use contracts::domain::a007_lottery_winner::{LotteryWinner, RecordWinnerDto, WinnerImportResult};

use super::a002_lottery_event::load_event;
use super::upload::{attachment, read_text_field, CSV_CONTENT_TYPE};
use crate::domain::a007_lottery_winner::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::system::auth::context::RequestContext;

/// GET /api/lottery/events/:id/winners
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<LotteryWinner>>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::list(&state.db, &event).await?))
}

/// POST /api/lottery/events/:id/winners
pub async fn record(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<RecordWinnerDto>,
) -> AppResult<Json<LotteryWinner>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::record(&state.db, &event, dto).await?))
}

/// DELETE /api/lottery/events/:id/winners/:winner_id
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, winner_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let event = load_event(&state, &ctx, &id).await?;
    service::delete(&state.db, &event, &winner_id).await?;
    Ok(StatusCode::OK)
}

/// GET /api/lottery/events/:id/winners/export.csv
pub async fn export_csv(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let event = load_event(&state, &ctx, &id).await?;
    let csv = service::export_csv(&state.db, &event).await?;
    Ok(attachment(
        CSV_CONTENT_TYPE,
        &format!("winners_{}.csv", event.base.code),
        csv,
    ))
}

/// POST /api/lottery/events/:id/winners/import-csv (multipart)
pub async fn import_csv(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<WinnerImportResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    let text = read_text_field(&mut multipart).await?;
    Ok(Json(service::import_csv(&state.db, &event, &text).await?))
}
