use sha2::{Digest, Sha256};

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Session-bound CSRF token: sha256(secret:sub:iat) as hex
pub fn csrf_token(secret: &str, sub: &str, iat: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", secret, sub, iat).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison of the presented token
pub fn verify_csrf(secret: &str, sub: &str, iat: usize, presented: &str) -> bool {
    let expected = csrf_token(secret, sub, iat);
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_bound_to_session() {
        let token = csrf_token("s", "user-1", 1_700_000_000);
        assert!(verify_csrf("s", "user-1", 1_700_000_000, &token));
        assert!(!verify_csrf("s", "user-1", 1_700_000_001, &token));
        assert!(!verify_csrf("s", "user-2", 1_700_000_000, &token));
        assert!(!verify_csrf("s", "user-1", 1_700_000_000, "short"));
    }
}
