use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};

use crate::shared::data::db::AppState;
use crate::shared::error::AppResult;
use crate::shared::logger;
use crate::system::auth::context::RequestContext;
use crate::system::users::service;

/// List all users (admin only)
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(service::list_all(&state.db).await?))
}

/// Get user by ID (admin only)
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    Ok(Json(service::get_by_id(&state.db, &id).await?))
}

/// Create user (admin only)
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(dto): Json<CreateUserDto>,
) -> AppResult<Json<serde_json::Value>> {
    let username = dto.username.clone();
    let user_id = service::create(&state.db, dto, Some(ctx.user_id.clone())).await?;
    logger::log(
        &state.db,
        "users",
        &format!("User {} created by {}", username.trim(), ctx.username),
    );
    Ok(Json(serde_json::json!({"id": user_id})))
}

/// Update user (admin only)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateUserDto>,
) -> AppResult<StatusCode> {
    // Ensure ID matches
    dto.id = id;
    service::update(&state.db, dto).await?;
    Ok(StatusCode::OK)
}

/// Delete user (admin only)
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    service::delete(&state.db, &ctx, &id).await?;
    logger::log(&state.db, "users", &format!("User {} deleted by {}", id, ctx.username));
    Ok(StatusCode::OK)
}

/// Change password
pub async fn change_password(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> AppResult<StatusCode> {
    // Ensure user_id matches
    dto.user_id = id;
    service::change_password(&state.db, dto, &ctx).await?;
    Ok(StatusCode::OK)
}
