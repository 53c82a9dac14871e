use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Local;
use contracts::domain::a009_csf_payment::{
    CsfDuplicateGroup, CsfPayment, CsfPaymentListItem, CsfReminderList, RecordCsfPaymentDto,
};
use contracts::shared::excel::ExcelData;
use contracts::usecases::u502_csf_import::CsfImportResult;
use serde::Deserialize;

use super::upload::{attachment, read_text_field};
use crate::domain::a001_community::service as community_service;
use crate::domain::a009_csf_payment::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::shared::xlsx::XLSX_CONTENT_TYPE;
use crate::system::auth::context::RequestContext;
use crate::usecases::u502_csf_import::executor;

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReminderQuery {
    pub month: Option<String>,
    pub amount: Option<f64>,
}

/// GET /api/csf/payments?month=2025-01
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<CsfPaymentListItem>>> {
    let month = match query.month.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(raw) => Some(service::parse_month(raw)?),
        None => None,
    };
    Ok(Json(
        service::list(&state.db, ctx.community_id()?, month.as_deref()).await?,
    ))
}

/// POST /api/csf/payments
pub async fn record(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<RecordCsfPaymentDto>,
) -> AppResult<Json<CsfPayment>> {
    Ok(Json(service::record(&state.db, ctx.community_id()?, dto).await?))
}

/// DELETE /api/csf/payments/:id
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    service::delete(&state.db, ctx.community_id()?, &id).await?;
    Ok(StatusCode::OK)
}

/// POST /api/csf/payments/import
pub async fn import(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(data): Json<ExcelData>,
) -> AppResult<Json<CsfImportResult>> {
    let result = executor::import_excel(&state.db, ctx.community_id()?, &data).await?;
    log_import(&state, &ctx, &result);
    Ok(Json(result))
}

/// POST /api/csf/payments/import-csv (multipart)
pub async fn import_csv(
    State(state): State<AppState>,
    ctx: RequestContext,
    mut multipart: Multipart,
) -> AppResult<Json<CsfImportResult>> {
    let text = read_text_field(&mut multipart).await?;
    let result = executor::import_csv(&state.db, ctx.community_id()?, &text).await?;
    log_import(&state, &ctx, &result);
    Ok(Json(result))
}

fn log_import(state: &AppState, ctx: &RequestContext, result: &CsfImportResult) {
    logger::log(
        &state.db,
        "import",
        &format!(
            "CSF import by {}: {} of {} rows imported, {} duplicates, {} errors",
            ctx.username,
            result.imported,
            result.rows_read,
            result.duplicates_in_file.len() + result.duplicates_in_db.len(),
            result.errors.len()
        ),
    );
}

/// GET /api/csf/duplicates
pub async fn duplicates(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<Vec<CsfDuplicateGroup>>> {
    Ok(Json(service::duplicates(&state.db, ctx.community_id()?).await?))
}

/// GET /api/csf/export.xlsx
pub async fn export_xlsx(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    let bytes = service::export_xlsx(&state.db, ctx.community_id()?).await?;
    let filename = format!("csf_payments_{}.xlsx", Local::now().format("%Y%m%d"));
    Ok(attachment(XLSX_CONTENT_TYPE, &filename, bytes))
}

/// GET /api/csf/reminders?month=&amount=
///
/// Month defaults to the current one.
pub async fn reminders(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ReminderQuery>,
) -> AppResult<Json<CsfReminderList>> {
    let community_id = ctx.community_id()?;
    let month = match query.month.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(raw) => service::parse_month(raw)?,
        None => Local::now().format("%Y-%m").to_string(),
    };
    let community = community_service::get_by_id(&state.db, community_id).await?;
    Ok(Json(
        service::reminders(
            &state.db,
            community_id,
            &community.base.description,
            &month,
            query.amount,
        )
        .await?,
    ))
}
