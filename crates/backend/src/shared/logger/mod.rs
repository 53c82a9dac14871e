pub mod repository;

use repository::log_event_internal;
use sea_orm::DatabaseConnection;

/// Логирование события на сервере в таблицу `system_log`
///
/// # Примеры
/// ```ignore
/// logger::log(&state.db, "startup", "Server started");
/// logger::warn(&state.db, "lottery", "Overpayment rejected for book 12");
/// ```
pub fn log(db: &DatabaseConnection, category: &str, message: &str) {
    log_event_internal(db, "server", category, "info", message);
}

pub fn warn(db: &DatabaseConnection, category: &str, message: &str) {
    log_event_internal(db, "server", category, "warn", message);
}

pub fn error(db: &DatabaseConnection, category: &str, message: &str) {
    log_event_internal(db, "server", category, "error", message);
}
