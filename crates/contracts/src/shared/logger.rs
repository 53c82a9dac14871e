use serde::{Deserialize, Serialize};

/// Запись лога системы
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    pub source: String, // "server", "task", "client"
    pub category: String,
    pub level: String,
    pub message: String,
}

/// DTO для создания новой записи лога
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLogRequest {
    pub source: String,
    pub category: String,
    #[serde(default = "default_level")]
    pub level: String,
    pub message: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    pub level: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u64>,
}
