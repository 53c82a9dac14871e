use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::shared::config::get_storage_path;
use crate::shared::data::db::AppState;
use crate::shared::logger::repository as log_repository;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;

pub const MARKER_FILE: &str = "last_log_clean.txt";

/// Время последней очистки (RFC 3339), если очистка уже проходила
pub fn read_marker(storage_dir: &Path) -> Option<String> {
    std::fs::read_to_string(storage_dir.join(MARKER_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn write_marker(storage_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(storage_dir)
        .with_context(|| format!("creating {}", storage_dir.display()))?;
    let path = storage_dir.join(MARKER_FILE);
    std::fs::write(&path, Utc::now().to_rfc3339()).with_context(|| format!("writing {}", path.display()))
}

/// Ежедневная очистка `system_log` старше `log_retention_days`
pub struct LogCleanManager;

#[async_trait]
impl TaskManager for LogCleanManager {
    fn task_type(&self) -> &'static str {
        "log_clean"
    }

    fn description(&self) -> &'static str {
        "Delete old system log rows"
    }

    async fn run(&self, state: &AppState, session_id: &str, logger: Arc<TaskLogger>) -> Result<String> {
        let days = state.config.health.log_retention_days;
        let deleted = log_repository::delete_older_than(&state.db, days).await?;
        logger.write_log(session_id, &format!("Deleted {} log rows older than {} days", deleted, days))?;

        write_marker(&get_storage_path(&state.config))?;
        Ok(format!("{} log rows older than {} days deleted", deleted, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::tasks::initialization::{build_registry, task_logger};
    use crate::system::tasks::service::run_task;
    use crate::test_support::test_state_with;

    #[tokio::test]
    async fn test_log_clean_writes_marker() {
        let (state, _mailer) = test_state_with(|_| {}).await;
        let storage = get_storage_path(&state.config);
        assert!(read_marker(&storage).is_none());

        let registry = build_registry(&state).unwrap();
        let result = run_task(&state, &registry, task_logger(&state), "log_clean").await.unwrap();
        assert_eq!(result.status, "completed");
        assert!(read_marker(&storage).is_some());
        assert!(result.log_file.is_some());
    }
}
