use anyhow::Result;
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use super::jwt;

pub async fn store<C: ConnectionTrait>(conn: &C, user_id: &str, token: &str) -> Result<()> {
    let token_id = uuid::Uuid::new_v4().to_string();
    let expires_at = jwt::calculate_refresh_token_expiration();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_refresh_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES (?, ?, ?, ?, ?)",
        [
            token_id.into(),
            user_id.to_string().into(),
            jwt::hash_token(token).into(),
            expires_at.into(),
            created_at.into(),
        ],
    ))
    .await?;

    Ok(())
}

/// User id of a live (unexpired, unrevoked) refresh token
pub async fn find_user<C: ConnectionTrait>(conn: &C, token: &str) -> Result<Option<String>> {
    let now = Utc::now().to_rfc3339();

    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT user_id FROM sys_refresh_tokens
             WHERE token_hash = ? AND expires_at > ? AND revoked_at IS NULL",
            [jwt::hash_token(token).into(), now.into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "user_id")?)),
        None => Ok(None),
    }
}

pub async fn revoke<C: ConnectionTrait>(conn: &C, token: &str) -> Result<()> {
    let revoked_at = Utc::now().to_rfc3339();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_refresh_tokens SET revoked_at = ? WHERE token_hash = ?",
        [revoked_at.into(), jwt::hash_token(token).into()],
    ))
    .await?;

    Ok(())
}

/// Revokes every session of a user (password change, deactivation)
pub async fn revoke_all_for_user<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<u64> {
    let revoked_at = Utc::now().to_rfc3339();
    let res = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
            [revoked_at.into(), user_id.to_string().into()],
        ))
        .await?;
    Ok(res.rows_affected())
}
