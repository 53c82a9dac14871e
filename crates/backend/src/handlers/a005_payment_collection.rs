use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use contracts::domain::a005_payment_collection::{
    DistributionPayments, MarkPaidDto, OverpaymentAuditRow, PaymentCollection, RecordPaymentDto,
};
use contracts::usecases::u501_level_report::LevelReportImportResult;

use super::a002_lottery_event::load_event;
use super::upload::{attachment, read_text_field, CSV_CONTENT_TYPE};
use crate::domain::a005_payment_collection::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;
use crate::usecases::u501_level_report::executor;

/// GET /api/lottery/events/:id/distributions/:dist_id/payments
pub async fn list_for_distribution(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
) -> AppResult<Json<DistributionPayments>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::list_for_distribution(&state.db, &event, &dist_id).await?))
}

/// POST /api/lottery/events/:id/distributions/:dist_id/payments
pub async fn record(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
    Json(dto): Json<RecordPaymentDto>,
) -> AppResult<Json<PaymentCollection>> {
    let event = load_event(&state, &ctx, &id).await?;
    let payment = service::record(&state.db, &event, &dist_id, dto, Some(ctx.username.clone())).await?;
    Ok(Json(payment))
}

/// POST /api/lottery/events/:id/distributions/:dist_id/mark-paid
pub async fn mark_paid(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, dist_id)): Path<(String, String)>,
    Json(dto): Json<MarkPaidDto>,
) -> AppResult<Json<PaymentCollection>> {
    let event = load_event(&state, &ctx, &id).await?;
    let payment = service::mark_paid(&state.db, &event, &dist_id, dto, Some(ctx.username.clone())).await?;
    Ok(Json(payment))
}

/// DELETE /api/lottery/events/:id/payments/:payment_id
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, payment_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let event = load_event(&state, &ctx, &id).await?;
    service::delete(&state.db, &event, &payment_id).await?;
    logger::log(
        &state.db,
        "lottery",
        &format!("Payment {} of {} deleted by {}", payment_id, event.base.code, ctx.username),
    );
    Ok(StatusCode::OK)
}

/// GET /api/lottery/events/:id/payments/export.csv
pub async fn export_csv(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let event = load_event(&state, &ctx, &id).await?;
    let csv = service::export_csv(&state.db, &event).await?;
    Ok(attachment(
        CSV_CONTENT_TYPE,
        &format!("payments_{}.csv", event.base.code),
        csv,
    ))
}

/// POST /api/lottery/events/:id/payments/import-csv (multipart, level report columns)
pub async fn import_csv(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<LevelReportImportResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    let text = read_text_field(&mut multipart).await?;
    Ok(Json(executor::import_csv(&state.db, &event, &text).await?))
}

/// GET /api/lottery/events/:id/payments/audit
pub async fn audit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<OverpaymentAuditRow>>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::audit_overpayments(&state.db, &event).await?))
}
