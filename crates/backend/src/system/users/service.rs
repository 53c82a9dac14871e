use chrono::Utc;
use contracts::enums::UserRole;
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};
use sea_orm::ConnectionTrait;

use super::repository;
use crate::domain::a001_community::repository as community_repository;
use crate::shared::error::{AppError, AppResult};
use crate::system::auth::context::RequestContext;
use crate::system::auth::{password, refresh_tokens};

fn validate_email(email: &Option<String>) -> AppResult<()> {
    if let Some(ref email) = email {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::validation("Invalid email format"));
        }
    }
    Ok(())
}

/// Group admins must belong to an existing, active community; admins to none
async fn resolve_community<C: ConnectionTrait>(
    conn: &C,
    role: UserRole,
    community_id: Option<String>,
) -> AppResult<Option<String>> {
    match role {
        UserRole::Admin => Ok(None),
        UserRole::GroupAdmin => {
            let id = community_id
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| AppError::validation("Group admin needs a community"))?;
            let community = community_repository::get_by_id(conn, &id)
                .await?
                .ok_or_else(|| AppError::validation("Community does not exist"))?;
            if !community.is_active {
                return Err(AppError::validation("Community is inactive"));
            }
            Ok(Some(id))
        }
    }
}

/// Create a new user
pub async fn create<C: ConnectionTrait>(
    conn: &C,
    dto: CreateUserDto,
    created_by: Option<String>,
) -> AppResult<String> {
    let username = dto.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("Username cannot be empty"));
    }

    if repository::get_by_username(conn, &username).await?.is_some() {
        return Err(AppError::conflict("Username already exists"));
    }

    validate_email(&dto.email)?;
    password::validate_password_strength(&dto.password).map_err(AppError::Validation)?;
    let community_id = resolve_community(conn, dto.role, dto.community_id).await?;

    let password_hash = password::hash_password(&dto.password)?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let user = User {
        id: user_id.clone(),
        username,
        email: dto.email,
        full_name: dto.full_name,
        role: dto.role,
        community_id,
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
        created_by,
    };

    repository::create_with_password(conn, &user, &password_hash).await?;
    tracing::info!("Created user {} ({})", user.username, user.role.code());

    Ok(user_id)
}

/// Update user
pub async fn update<C: ConnectionTrait>(conn: &C, dto: UpdateUserDto) -> AppResult<()> {
    let mut user = repository::get_by_id(conn, &dto.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    validate_email(&dto.email)?;
    let community_id = resolve_community(conn, dto.role, dto.community_id).await?;

    let deactivated = user.is_active && !dto.is_active;

    user.email = dto.email;
    user.full_name = dto.full_name;
    user.is_active = dto.is_active;
    user.role = dto.role;
    user.community_id = community_id;
    user.updated_at = Utc::now().to_rfc3339();

    repository::update(conn, &user).await?;

    if deactivated {
        refresh_tokens::revoke_all_for_user(conn, &user.id).await?;
    }

    Ok(())
}

/// Delete user; nobody can delete their own account
pub async fn delete<C: ConnectionTrait>(conn: &C, ctx: &RequestContext, id: &str) -> AppResult<()> {
    if ctx.user_id == id {
        return Err(AppError::validation("You cannot delete your own account"));
    }
    if !repository::delete(conn, id).await? {
        return Err(AppError::not_found("User not found"));
    }
    Ok(())
}

/// Get user by ID
pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<User> {
    repository::get_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// List all users
pub async fn list_all<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<User>> {
    Ok(repository::list_all(conn).await?)
}

/// Change user password
pub async fn change_password<C: ConnectionTrait>(
    conn: &C,
    dto: ChangePasswordDto,
    ctx: &RequestContext,
) -> AppResult<()> {
    repository::get_by_id(conn, &dto.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if dto.user_id != ctx.user_id {
        // Changing someone else's password - must be admin
        if !ctx.is_admin() {
            return Err(AppError::forbidden("Permission denied"));
        }
    } else {
        // Own password: the current one is always required
        let old_password = dto
            .old_password
            .as_deref()
            .ok_or_else(|| AppError::validation("Current password is required"))?;
        let current_hash = repository::get_password_hash(conn, &dto.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !password::verify_password(old_password, &current_hash)? {
            return Err(AppError::validation("Invalid old password"));
        }
    }

    password::validate_password_strength(&dto.new_password).map_err(AppError::Validation)?;
    let new_hash = password::hash_password(&dto.new_password)?;
    repository::update_password(conn, &dto.user_id, &new_hash).await?;

    Ok(())
}

/// Verify user credentials (for login)
pub async fn verify_credentials<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Invalid username or password".into());

    let user = repository::get_by_username(conn, username.trim())
        .await?
        .ok_or_else(invalid)?;

    let password_hash = repository::get_password_hash(conn, &user.id)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(password, &password_hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("User account is inactive".into()));
    }

    if let Err(e) = repository::update_last_login(conn, &user.id).await {
        tracing::warn!("Failed to update last login for {}: {}", user.username, e);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_community::service as community_service;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a001_community::CommunityDto;

    fn admin_ctx(id: &str) -> RequestContext {
        RequestContext::new(id, "admin", UserRole::Admin, None)
    }

    fn group_admin(username: &str, community_id: Option<String>) -> CreateUserDto {
        CreateUserDto {
            username: username.into(),
            password: "secret123".into(),
            email: Some("g@example.com".into()),
            full_name: None,
            role: UserRole::GroupAdmin,
            community_id,
        }
    }

    async fn community(db: &sea_orm::DatabaseConnection) -> String {
        community_service::create(
            db,
            CommunityDto {
                id: None,
                code: "GREEN".into(),
                name: "Green Park".into(),
                address: None,
                comment: None,
                is_active: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_validations() {
        let db = connect_in_memory().await.unwrap();
        let cid = community(&db).await;

        assert!(matches!(
            create(&db, group_admin("g1", None), None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create(&db, group_admin("g1", Some("missing".into())), None).await,
            Err(AppError::Validation(_))
        ));

        let mut weak = group_admin("g1", Some(cid.clone()));
        weak.password = "weak".into();
        assert!(matches!(create(&db, weak, None).await, Err(AppError::Validation(_))));

        create(&db, group_admin("g1", Some(cid.clone())), None).await.unwrap();
        assert!(matches!(
            create(&db, group_admin("g1", Some(cid)), None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_credentials_and_self_delete() {
        let db = connect_in_memory().await.unwrap();
        let cid = community(&db).await;
        let id = create(&db, group_admin("g1", Some(cid.clone())), None).await.unwrap();

        let user = verify_credentials(&db, "g1", "secret123").await.unwrap();
        assert_eq!(user.community_id.as_deref(), Some(cid.as_str()));
        assert!(verify_credentials(&db, "g1", "wrong").await.is_err());

        let mut dto = UpdateUserDto {
            id: id.clone(),
            email: None,
            full_name: None,
            is_active: false,
            role: UserRole::GroupAdmin,
            community_id: Some(cid),
        };
        update(&db, dto.clone()).await.unwrap();
        assert!(matches!(
            verify_credentials(&db, "g1", "secret123").await,
            Err(AppError::Unauthorized(_))
        ));
        dto.is_active = true;
        update(&db, dto).await.unwrap();

        assert!(delete(&db, &admin_ctx(&id), &id).await.is_err());
        delete(&db, &admin_ctx("someone-else"), &id).await.unwrap();
        assert!(matches!(get_by_id(&db, &id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_change_password_rules() {
        let db = connect_in_memory().await.unwrap();
        let cid = community(&db).await;
        let id = create(&db, group_admin("g1", Some(cid.clone())), None).await.unwrap();
        let own = RequestContext::new(&id, "g1", UserRole::GroupAdmin, Some(cid));

        let without_old = ChangePasswordDto {
            user_id: id.clone(),
            old_password: None,
            new_password: "newpass123".into(),
        };
        assert!(change_password(&db, without_old.clone(), &own).await.is_err());

        let with_old = ChangePasswordDto {
            old_password: Some("secret123".into()),
            ..without_old.clone()
        };
        change_password(&db, with_old, &own).await.unwrap();
        verify_credentials(&db, "g1", "newpass123").await.unwrap();

        let other = RequestContext::new("x", "other", UserRole::GroupAdmin, Some("c".into()));
        assert!(matches!(
            change_password(&db, without_old.clone(), &other).await,
            Err(AppError::Forbidden(_))
        ));
        change_password(&db, without_old, &admin_ctx("a")).await.unwrap();
    }
}
