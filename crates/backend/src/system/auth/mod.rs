pub mod context;
pub mod csrf;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_tokens;
