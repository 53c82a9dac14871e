use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use contracts::enums::{FeatureKey, UserRole};
use contracts::system::auth::TokenClaims;

use super::{csrf, jwt};
use crate::domain::a001_community::service as community_service;
use crate::shared::data::db::AppState;
use crate::shared::error::{AppError, AppResult};

/// Validates the bearer token and, on mutating methods, the CSRF header
fn authenticate(state: &AppState, req: &Request<Body>) -> AppResult<TokenClaims> {
    let unauthorized = || AppError::Unauthorized("Authentication required".into());

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(unauthorized)?;

    let claims = jwt::validate_token(&state.jwt_secret, token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    ) {
        let presented = req
            .headers()
            .get(csrf::CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        if !csrf::verify_csrf(&state.jwt_secret, &claims.sub, claims.iat, presented) {
            return Err(AppError::forbidden("Invalid CSRF token"));
        }
    }

    Ok(claims)
}

/// Middleware that requires valid JWT authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    // Add claims to request extensions for use in handlers
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that requires admin privileges
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;
    if claims.role != UserRole::Admin {
        return Err(AppError::forbidden("Administrator access required"));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware for community pages: group admin bound to a community
pub async fn require_group_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = group_admin_claims(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn group_admin_claims(state: &AppState, req: &Request<Body>) -> AppResult<TokenClaims> {
    let claims = authenticate(state, req)?;
    if claims.role != UserRole::GroupAdmin {
        return Err(AppError::forbidden("Group admin access required"));
    }
    if claims.community_id.is_none() {
        return Err(AppError::forbidden("No community is assigned to this account"));
    }
    Ok(claims)
}

async fn require_feature(
    state: AppState,
    mut req: Request<Body>,
    next: Next,
    feature: FeatureKey,
) -> Result<Response, AppError> {
    let claims = group_admin_claims(&state, &req)?;
    if let Some(community_id) = claims.community_id.as_deref() {
        community_service::ensure_feature_enabled(&state.db, community_id, feature).await?;
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Group admin whose community has the lottery feature enabled
pub async fn require_lottery(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_feature(state, req, next, FeatureKey::Lottery).await
}

/// Group admin whose community has the CSF feature enabled
pub async fn require_csf(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_feature(state, req, next, FeatureKey::Csf).await
}
