use axum::{extract::State, http::StatusCode, Json};
use contracts::system::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserInfo};
use contracts::system::users::User;

use crate::shared::data::db::AppState;
use crate::shared::error::{AppError, AppResult};
use crate::shared::logger;
use crate::system::auth::context::RequestContext;
use crate::system::auth::{csrf, jwt, refresh_tokens};
use crate::system::users::service as user_service;

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        role: user.role,
        community_id: user.community_id,
    }
}

/// Login handler
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = match user_service::verify_credentials(&state.db, &request.username, &request.password).await {
        Ok(user) => user,
        Err(e) => {
            logger::warn(
                &state.db,
                "auth",
                &format!("Failed login for '{}'", request.username.trim()),
            );
            return Err(e);
        }
    };

    let (access_token, claims) = jwt::generate_access_token(
        &state.jwt_secret,
        &user.id,
        &user.username,
        user.role,
        user.community_id.clone(),
    )?;
    let refresh_token = jwt::generate_refresh_token();
    refresh_tokens::store(&state.db, &user.id, &refresh_token).await?;

    logger::log(&state.db, "auth", &format!("{} logged in", user.username));
    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        csrf_token: csrf::csrf_token(&state.jwt_secret, &claims.sub, claims.iat),
        user: user_info(user),
    }))
}

/// Refresh token handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let invalid = || AppError::Unauthorized("Invalid or expired refresh token".into());
    let user_id = refresh_tokens::find_user(&state.db, &request.refresh_token)
        .await?
        .ok_or_else(invalid)?;

    let user = user_service::get_by_id(&state.db, &user_id)
        .await
        .map_err(|_| invalid())?;
    if !user.is_active {
        return Err(AppError::Unauthorized("User account is inactive".into()));
    }

    let (access_token, claims) = jwt::generate_access_token(
        &state.jwt_secret,
        &user.id,
        &user.username,
        user.role,
        user.community_id.clone(),
    )?;

    Ok(Json(RefreshResponse {
        access_token,
        csrf_token: csrf::csrf_token(&state.jwt_secret, &claims.sub, claims.iat),
    }))
}

/// Logout handler
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    refresh_tokens::revoke(&state.db, &request.refresh_token).await?;
    Ok(StatusCode::OK)
}

/// Get current user handler (protected by middleware)
pub async fn current_user(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Json<UserInfo>> {
    let user = user_service::get_by_id(&state.db, &ctx.user_id).await?;
    Ok(Json(user_info(user)))
}
