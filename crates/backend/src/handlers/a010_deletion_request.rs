use axum::{
    extract::{Path, Query, State},
    Json,
};
use contracts::domain::a010_deletion_request::{
    CreateDeletionRequestDto, DecideDeletionRequestDto, DeletionRequest,
};
use serde::Deserialize;

use crate::domain::a010_deletion_request::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/admin/deletion-requests?status=pending
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DeletionRequest>>> {
    Ok(Json(service::list(&state.db, query.status.as_deref()).await?))
}

/// POST /api/admin/deletion-requests/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<DecideDeletionRequestDto>,
) -> AppResult<Json<DeletionRequest>> {
    let request = service::approve(&state.db, &ctx, &id, dto).await?;
    logger::warn(
        &state.db,
        "deletion",
        &format!("{} approved deletion of {}", ctx.username, request.target_label),
    );
    Ok(Json(request))
}

/// POST /api/admin/deletion-requests/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<DecideDeletionRequestDto>,
) -> AppResult<Json<DeletionRequest>> {
    let request = service::reject(&state.db, &ctx, &id, dto).await?;
    logger::log(
        &state.db,
        "deletion",
        &format!("{} rejected deletion of {}", ctx.username, request.target_label),
    );
    Ok(Json(request))
}

/// POST /api/lottery/events/:id/deletion-request
pub async fn request_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<CreateDeletionRequestDto>,
) -> AppResult<Json<DeletionRequest>> {
    let request = service::request_event_deletion(&state.db, &ctx, &id, dto).await?;
    notify_admins(&state, &request).await;
    Ok(Json(request))
}

/// POST /api/csf/members/:id/deletion-request
pub async fn request_member(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<CreateDeletionRequestDto>,
) -> AppResult<Json<DeletionRequest>> {
    let request = service::request_member_deletion(&state.db, &ctx, &id, dto).await?;
    notify_admins(&state, &request).await;
    Ok(Json(request))
}

/// Mail failures never fail the request itself
async fn notify_admins(state: &AppState, request: &DeletionRequest) {
    logger::log(
        &state.db,
        "deletion",
        &format!(
            "{} requested deletion of {}: {}",
            request.requested_by, request.target_label, request.reason
        ),
    );

    let recipients = state.mailer.admin_recipients();
    if recipients.is_empty() {
        return;
    }
    let subject = format!("Deletion request: {}", request.target_label);
    let body = format!(
        "{} asked to delete {} ({}).\n\nReason: {}\n\nReview it on the admin deletion requests page.",
        request.requested_by,
        request.target_label,
        request.target_type.code(),
        request.reason
    );
    if let Err(e) = state.mailer.send(&recipients, &subject, &body).await {
        tracing::warn!("Failed to notify admins about deletion request {}: {:#}", request.id, e);
    }
}
