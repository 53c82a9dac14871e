use axum::{
    extract::{Path, State},
    Json,
};
use contracts::domain::a008_csf_member::{CsfMember, CsfMemberDto};

use crate::domain::a008_csf_member::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::system::auth::context::RequestContext;

/// GET /api/csf/members
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<Vec<CsfMember>>> {
    Ok(Json(service::list(&state.db, ctx.community_id()?).await?))
}

/// POST /api/csf/members
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<CsfMemberDto>,
) -> AppResult<Json<CsfMember>> {
    Ok(Json(service::create(&state.db, ctx.community_id()?, dto).await?))
}

/// GET /api/csf/members/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<CsfMember>> {
    Ok(Json(
        service::get_for_community(&state.db, ctx.community_id()?, &id).await?,
    ))
}

/// PUT /api/csf/members/:id
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(dto): Json<CsfMemberDto>,
) -> AppResult<Json<CsfMember>> {
    Ok(Json(service::update(&state.db, ctx.community_id()?, &id, dto).await?))
}
