// Authentication handlers
pub mod auth;

// User management handlers
pub mod users;

// Logging handlers
pub mod logs;

// Scheduled tasks handlers
pub mod tasks;
