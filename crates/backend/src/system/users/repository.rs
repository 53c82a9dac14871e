use anyhow::{Context, Result};
use contracts::enums::UserRole;
use contracts::system::users::User;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

const USER_COLUMNS: &str = "id, username, email, full_name, role, community_id, is_active, created_at, updated_at, last_login_at, created_by";

fn map_row(row: &QueryResult) -> Result<User> {
    let role: String = row.try_get("", "role")?;
    Ok(User {
        id: row.try_get("", "id")?,
        username: row.try_get("", "username")?,
        email: row.try_get("", "email")?,
        full_name: row.try_get("", "full_name")?,
        role: UserRole::from_code(&role).unwrap_or(UserRole::GroupAdmin),
        community_id: row.try_get("", "community_id")?,
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login_at: row.try_get("", "last_login_at")?,
        created_by: row.try_get("", "created_by")?,
    })
}

/// Create user with password hash
pub async fn create_with_password<C: ConnectionTrait>(
    conn: &C,
    user: &User,
    password_hash: &str,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_users (id, username, email, password_hash, full_name, role, community_id, is_active, created_at, updated_at, last_login_at, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            user.id.clone().into(),
            user.username.clone().into(),
            user.email.clone().into(),
            password_hash.to_string().into(),
            user.full_name.clone().into(),
            user.role.code().into(),
            user.community_id.clone().into(),
            (if user.is_active { 1 } else { 0 }).into(),
            user.created_at.clone().into(),
            user.updated_at.clone().into(),
            user.last_login_at.clone().into(),
            user.created_by.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert user")?;

    Ok(())
}

/// Get user by ID
pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<User>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_users WHERE id = ?", USER_COLUMNS),
            [id.into()],
        ))
        .await?;

    result.as_ref().map(map_row).transpose()
}

/// Get user by username
pub async fn get_by_username<C: ConnectionTrait>(conn: &C, username: &str) -> Result<Option<User>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_users WHERE username = ?", USER_COLUMNS),
            [username.into()],
        ))
        .await?;

    result.as_ref().map(map_row).transpose()
}

/// Get password hash for user
pub async fn get_password_hash<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<Option<String>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "password_hash")?)),
        None => Ok(None),
    }
}

/// List all users
pub async fn list_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<User>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_users ORDER BY created_at DESC", USER_COLUMNS),
        ))
        .await?;

    rows.iter().map(map_row).collect()
}

/// Update user
pub async fn update<C: ConnectionTrait>(conn: &C, user: &User) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users
         SET email = ?, full_name = ?, role = ?, community_id = ?, is_active = ?, updated_at = ?
         WHERE id = ?",
        [
            user.email.clone().into(),
            user.full_name.clone().into(),
            user.role.code().into(),
            user.community_id.clone().into(),
            (if user.is_active { 1 } else { 0 }).into(),
            user.updated_at.clone().into(),
            user.id.clone().into(),
        ],
    ))
    .await
    .context("Failed to update user")?;

    Ok(())
}

/// Delete user (hard delete)
pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> Result<bool> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_users WHERE id = ?",
            [id.into()],
        ))
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

/// Update last login timestamp
pub async fn update_last_login<C: ConnectionTrait>(conn: &C, id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET last_login_at = ? WHERE id = ?",
        [now.into(), id.to_string().into()],
    ))
    .await
    .context("Failed to update last login")?;

    Ok(())
}

/// Count total users
pub async fn count_users<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_users".to_string(),
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}

/// Update user password
pub async fn update_password<C: ConnectionTrait>(conn: &C, id: &str, password_hash: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET password_hash = ?, updated_at = ? WHERE id = ?",
        [
            password_hash.to_string().into(),
            chrono::Utc::now().to_rfc3339().into(),
            id.to_string().into(),
        ],
    ))
    .await
    .context("Failed to update password")?;

    Ok(())
}
