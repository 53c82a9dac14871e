use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use contracts::enums::UserRole;
use contracts::system::auth::TokenClaims;

use crate::shared::error::{AppError, AppResult};

/// Caller identity built from the JWT claims set by the auth middleware.
///
/// Usage in handlers: `async fn handler(ctx: RequestContext) -> ...`
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
    community_id: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: &str, username: &str, role: UserRole, community_id: Option<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            role,
            community_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Community the caller works in; group admins always have one
    pub fn community_id(&self) -> AppResult<&str> {
        self.community_id
            .as_deref()
            .ok_or_else(|| AppError::forbidden("No community is assigned to this account"))
    }
}

impl From<&TokenClaims> for RequestContext {
    fn from(claims: &TokenClaims) -> Self {
        RequestContext::new(
            &claims.sub,
            &claims.username,
            claims.role,
            claims.community_id.clone(),
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Extract TokenClaims from request extensions (set by middleware)
        parts
            .extensions
            .get::<TokenClaims>()
            .map(RequestContext::from)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_required() {
        let admin = RequestContext::new("u", "admin", UserRole::Admin, None);
        assert!(admin.is_admin());
        assert!(matches!(admin.community_id(), Err(AppError::Forbidden(_))));

        let group = RequestContext::new("u", "g", UserRole::GroupAdmin, Some("c1".into()));
        assert_eq!(group.community_id().unwrap(), "c1");
    }
}
