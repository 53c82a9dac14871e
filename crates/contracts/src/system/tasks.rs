use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered scheduled task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: String,
    pub description: String,
    pub schedule_cron: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunResponse {
    pub task: String,
    pub session_id: String,
    pub status: String,
    pub summary: String,
    pub log_file: Option<String>,
}
