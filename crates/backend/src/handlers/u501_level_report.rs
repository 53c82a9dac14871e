use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use contracts::shared::excel::ExcelData;
use contracts::usecases::u501_level_report::LevelReportImportResult;

use super::a002_lottery_event::load_event;
use super::upload::attachment;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::shared::xlsx::XLSX_CONTENT_TYPE;
use crate::system::auth::context::RequestContext;
use crate::usecases::u501_level_report::{executor, export};

/// GET /api/lottery/events/:id/report.xlsx
pub async fn export_xlsx(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let event = load_event(&state, &ctx, &id).await?;
    let bytes = export::export_xlsx(&state.db, &event).await?;
    Ok(attachment(
        XLSX_CONTENT_TYPE,
        &format!("level_report_{}.xlsx", event.base.code),
        bytes,
    ))
}

/// POST /api/lottery/events/:id/report/import
pub async fn import(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(data): Json<ExcelData>,
) -> AppResult<Json<LevelReportImportResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    let result = executor::import_excel(&state.db, &event, &data).await?;
    logger::log(
        &state.db,
        "import",
        &format!(
            "Level report of {} imported by {}: {} payments, {} skipped rows",
            event.base.code,
            ctx.username,
            result.payments_upserted,
            result.skipped.len()
        ),
    );
    Ok(Json(result))
}
