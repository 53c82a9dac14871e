use anyhow::Result;
use std::sync::Arc;

use super::{
    logger::TaskLogger,
    managers::{HealthCheckManager, LogCleanManager, WeeklyDigestManager},
    registry::TaskManagerRegistry,
    worker::ScheduledTaskWorker,
};
use crate::shared::config::get_storage_path;
use crate::shared::data::db::AppState;

/// Реестр со всеми задачами и расписаниями из `[tasks]`
pub fn build_registry(state: &AppState) -> Result<TaskManagerRegistry> {
    let tasks = &state.config.tasks;
    let mut registry = TaskManagerRegistry::new();
    registry.register(HealthCheckManager, Some(tasks.health_check.as_str()))?;
    registry.register(WeeklyDigestManager, Some(tasks.weekly_digest.as_str()))?;
    registry.register(LogCleanManager, Some(tasks.log_clean.as_str()))?;
    Ok(registry)
}

pub fn task_logger(state: &AppState) -> Arc<TaskLogger> {
    Arc::new(TaskLogger::new(&get_storage_path(&state.config)))
}

/// Инициализирует реестр задач и фоновый воркер.
pub fn initialize_scheduled_tasks(state: &AppState) -> Result<ScheduledTaskWorker> {
    let registry = build_registry(state)?;
    Ok(ScheduledTaskWorker::new(
        state.clone(),
        Arc::new(registry),
        task_logger(state),
        30, // Check every 30 seconds
    ))
}
