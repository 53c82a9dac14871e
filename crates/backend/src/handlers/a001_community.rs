use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_community::{Community, CommunityDto, CommunityFeature, SetFeatureDto};
use serde_json::json;

use crate::domain::a001_community::service;
use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;

/// GET /api/admin/communities
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<Vec<Community>>> {
    Ok(Json(service::list_all(&state.db).await?))
}

/// GET /api/admin/communities/:id
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Community>> {
    Ok(Json(service::get_by_id(&state.db, &id).await?))
}

/// POST /api/admin/communities
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<CommunityDto>,
) -> AppResult<Json<serde_json::Value>> {
    let name = dto.name.clone();
    let id = service::create(&state.db, dto).await?;
    logger::log(
        &state.db,
        "community",
        &format!("Community '{}' created by {}", name.trim(), ctx.username),
    );
    Ok(Json(json!({ "id": id })))
}

/// PUT /api/admin/communities/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<CommunityDto>,
) -> AppResult<StatusCode> {
    service::update(&state.db, &id, dto).await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/admin/communities/:id
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    service::delete(&state.db, &id).await?;
    logger::warn(
        &state.db,
        "community",
        &format!("Community {} deleted by {}", id, ctx.username),
    );
    Ok(StatusCode::OK)
}

/// GET /api/admin/communities/:id/features
pub async fn list_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CommunityFeature>>> {
    Ok(Json(service::list_features(&state.db, &id).await?))
}

/// POST /api/admin/communities/:id/features
pub async fn set_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(dto): Json<SetFeatureDto>,
) -> AppResult<Json<Vec<CommunityFeature>>> {
    service::set_feature(&state.db, &id, dto).await?;
    Ok(Json(service::list_features(&state.db, &id).await?))
}

/// GET /api/community (group admin: own community and its enabled features)
pub async fn current(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<serde_json::Value>> {
    let community_id = ctx.community_id()?;
    let community = service::get_by_id(&state.db, community_id).await?;
    let features = service::list_features(&state.db, community_id).await?;
    Ok(Json(json!({ "community": community, "features": features })))
}
