use axum::{
    extract::{Path, Query, State},
    Json,
};
use contracts::domain::a003_lottery_book::{BookListItem, BookListQuery, GenerateBooksResult, TicketLookup};
use contracts::domain::a004_book_distribution::{AssignBookDto, BookDistribution};

use super::a002_lottery_event::load_event;
use crate::domain::a003_lottery_book::service;
use crate::domain::a004_book_distribution::service as distribution_service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;

/// POST /api/lottery/events/:id/books/generate
pub async fn generate(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<GenerateBooksResult>> {
    let event = load_event(&state, &ctx, &id).await?;
    let result = service::generate(&state.db, &event).await?;
    logger::log(
        &state.db,
        "lottery",
        &format!("{} books generated for {} by {}", result.generated, event.base.code, ctx.username),
    );
    Ok(Json(result))
}

/// GET /api/lottery/events/:id/books?status=&level_1=&search=
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Query(query): Query<BookListQuery>,
) -> AppResult<Json<Vec<BookListItem>>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::list(&state.db, &event, &query).await?))
}

/// GET /api/lottery/events/:id/tickets/:number
pub async fn lookup_ticket(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, number)): Path<(String, i64)>,
) -> AppResult<Json<TicketLookup>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(service::lookup_ticket(&state.db, &event, number).await?))
}

/// POST /api/lottery/events/:id/books/:book_id/assign
pub async fn assign(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, book_id)): Path<(String, String)>,
    Json(dto): Json<AssignBookDto>,
) -> AppResult<Json<BookDistribution>> {
    let event = load_event(&state, &ctx, &id).await?;
    Ok(Json(
        distribution_service::assign(&state.db, &event, &book_id, dto, false).await?,
    ))
}
