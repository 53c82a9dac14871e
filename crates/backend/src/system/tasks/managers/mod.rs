pub mod health_check;
pub mod log_clean;
pub mod weekly_digest;

pub use health_check::HealthCheckManager;
pub use log_clean::LogCleanManager;
pub use weekly_digest::WeeklyDigestManager;
