use anyhow::{Context, Result};
use chrono::Utc;
use contracts::enums::UserRole;
use contracts::system::auth::TokenClaims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use sha2::{Digest, Sha256};

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24; // 24 hours for long lifetime
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90; // 90 days
const JWT_SECRET_KEY: &str = "jwt_secret";

/// Generate JWT access token with 24 hours lifetime
pub fn generate_access_token(
    secret: &str,
    user_id: &str,
    username: &str,
    role: UserRole,
    community_id: Option<String>,
) -> Result<(String, TokenClaims)> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role,
        community_id,
        exp,
        iat,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")?;

    Ok((token, claims))
}

/// Validate JWT token and extract claims
pub fn validate_token(secret: &str, token: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Generate refresh token (UUID-based)
pub fn generate_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Refresh tokens are stored only as their SHA-256 hex digest
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Get or create JWT secret in `sys_settings`
pub async fn load_or_create_secret<C: ConnectionTrait>(conn: &C) -> Result<String> {
    if let Some(secret) = get_jwt_secret_from_db(conn).await? {
        return Ok(secret);
    }
    let secret = generate_jwt_secret();
    save_jwt_secret_to_db(conn, &secret).await?;
    tracing::info!("Generated new JWT secret");
    Ok(secret)
}

/// Generate a cryptographically secure JWT secret (256 bits)
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db<C: ConnectionTrait>(conn: &C) -> Result<Option<String>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            [JWT_SECRET_KEY.into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let secret: String = row.try_get("", "value")?;
            Ok(Some(secret))
        }
        None => Ok(None),
    }
}

async fn save_jwt_secret_to_db<C: ConnectionTrait>(conn: &C, secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR REPLACE INTO sys_settings (key, value, description, updated_at)
         VALUES (?, ?, ?, ?)",
        [
            JWT_SECRET_KEY.into(),
            secret.to_string().into(),
            "Auto-generated JWT secret for authentication".into(),
            now.into(),
        ],
    ))
    .await
    .context("Failed to store JWT secret")?;

    Ok(())
}

/// Calculate refresh token expiration timestamp
pub fn calculate_refresh_token_expiration() -> String {
    let exp = Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS);
    exp.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[test]
    fn test_token_round_trip() {
        let (token, claims) = generate_access_token(
            "secret",
            "u1",
            "green_admin",
            UserRole::GroupAdmin,
            Some("c1".into()),
        )
        .unwrap();
        let decoded = validate_token("secret", &token).unwrap();
        assert_eq!(decoded.sub, "u1");
        assert_eq!(decoded.role, UserRole::GroupAdmin);
        assert_eq!(decoded.community_id.as_deref(), Some("c1"));
        assert_eq!(decoded.iat, claims.iat);
        assert!(validate_token("other", &token).is_err());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let h = hash_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_token("abc"));
        assert_ne!(h, hash_token("abd"));
    }

    #[tokio::test]
    async fn test_secret_persisted_once() {
        let db = connect_in_memory().await.unwrap();
        let first = load_or_create_secret(&db).await.unwrap();
        let second = load_or_create_secret(&db).await.unwrap();
        assert_eq!(first, second);
        assert!(first.len() >= 43);
    }
}
