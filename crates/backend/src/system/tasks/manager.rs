use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::logger::TaskLogger;
use crate::shared::data::db::AppState;

/// Трейт для менеджеров запланированных задач.
/// Каждый тип задачи имеет свою реализацию этого трейта.
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Имя задачи: ключ в `[tasks]` конфига и аргумент `backend task <name>`
    fn task_type(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Запускает выполнение задачи и возвращает краткий итог.
    /// `session_id`: идентификатор текущего запуска, он же имя лог-файла.
    async fn run(&self, state: &AppState, session_id: &str, logger: Arc<TaskLogger>) -> Result<String>;
}
