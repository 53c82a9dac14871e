use chrono::Utc;
use contracts::system::tasks::TaskRunResponse;
use std::sync::Arc;

use super::logger::TaskLogger;
use super::registry::TaskManagerRegistry;
use crate::shared::data::db::AppState;
use crate::shared::logger::repository::log_event;

/// Запускает задачу по имени: пишет лог-файл сессии и запись в `system_log`.
///
/// Неизвестное имя это ошибка; сбой самой задачи возвращается как
/// `status = "failed"` с текстом ошибки в `summary`.
pub async fn run_task(
    state: &AppState,
    registry: &TaskManagerRegistry,
    logger: Arc<TaskLogger>,
    name: &str,
) -> anyhow::Result<TaskRunResponse> {
    let manager = registry.get(name).ok_or_else(|| {
        anyhow::anyhow!("Unknown task '{}'. Available: {}", name, registry.names().join(", "))
    })?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let started = Utc::now();
    logger.write_log(&session_id, &format!("Task {} started", name))?;
    tracing::info!("Task {} started (session {})", name, session_id);

    let outcome = manager.run(state, &session_id, Arc::clone(&logger)).await;
    let elapsed_ms = (Utc::now() - started).num_milliseconds();

    let (status, level, summary) = match outcome {
        Ok(summary) => ("completed", "info", summary),
        Err(e) => {
            tracing::error!("Task {} failed: {:#}", name, e);
            ("failed", "error", format!("{:#}", e))
        }
    };
    logger.write_log(&session_id, &format!("Task {} {} in {} ms: {}", name, status, elapsed_ms, summary))?;
    if let Err(e) = log_event(&state.db, "task", name, level, &summary).await {
        tracing::warn!("Failed to log task result: {}", e);
    }

    Ok(TaskRunResponse {
        task: name.to_string(),
        session_id: session_id.clone(),
        status: status.to_string(),
        summary,
        log_file: Some(logger.get_log_file_path(&session_id).display().to_string()),
    })
}
