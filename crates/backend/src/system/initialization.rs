use anyhow::Result;
use contracts::enums::UserRole;
use contracts::system::users::CreateUserDto;
use sea_orm::DatabaseConnection;

use crate::system::users::{repository, service};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin1234";

/// Ensure admin user exists (create if table is empty)
pub async fn ensure_admin_user_exists(db: &DatabaseConnection) -> Result<Option<String>> {
    if repository::count_users(db).await? > 0 {
        return Ok(None);
    }

    tracing::info!("No users found. Creating default admin user...");
    let admin_dto = CreateUserDto {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
        email: None,
        full_name: Some("Administrator".to_string()),
        role: UserRole::Admin,
        community_id: None,
    };

    let admin_id = service::create(db, admin_dto, None)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot create default admin: {}", e))?;

    tracing::warn!("═══════════════════════════════════════════════");
    tracing::warn!("  Default admin user created!");
    tracing::warn!("  Username: {}", DEFAULT_ADMIN_USERNAME);
    tracing::warn!("  Password: {}", DEFAULT_ADMIN_PASSWORD);
    tracing::warn!("  ⚠️  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");
    tracing::warn!("═══════════════════════════════════════════════");

    Ok(Some(admin_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_admin_created_once() {
        let db = connect_in_memory().await.unwrap();

        let first = ensure_admin_user_exists(&db).await.unwrap();
        assert!(first.is_some());
        assert!(ensure_admin_user_exists(&db).await.unwrap().is_none());

        let admin = service::verify_credentials(&db, DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }
}
