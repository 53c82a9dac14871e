use crate::shared::logger::LogEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLevelCount {
    pub level: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityCounts {
    pub communities: i64,
    pub users: i64,
    pub lottery_events: i64,
    pub books: i64,
    pub payments: i64,
    pub csf_members: i64,
    pub csf_payments: i64,
    pub pending_deletion_requests: i64,
}

/// Snapshot shown on the admin health page and used by the health task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub generated_at: String,
    pub load_average: Option<LoadAverage>,
    pub memory: Option<MemoryInfo>,
    pub uptime_seconds: Option<f64>,
    pub db_size_bytes: Option<u64>,
    pub log_counts_24h: Vec<LogLevelCount>,
    pub last_log_clean: Option<String>,
    pub counts: EntityCounts,
    pub recent_errors: Vec<LogEntry>,
    /// Threshold breaches, empty when healthy
    pub alerts: Vec<String>,
}
