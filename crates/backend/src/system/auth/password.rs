use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash password with Argon2 (PHC string)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify password against stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// At least 8 characters with a letter and a digit
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain letters and digits".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("lottery2025").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("lottery2025", &hash).unwrap());
        assert!(!verify_password("lottery2026", &hash).unwrap());
        assert!(verify_password("x", "garbage").is_err());
    }

    #[test]
    fn test_strength() {
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("longbutnodigits").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("secret123").is_ok());
    }
}
