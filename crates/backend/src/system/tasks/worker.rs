use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use super::{logger::TaskLogger, registry::TaskManagerRegistry, service};
use crate::shared::data::db::AppState;

/// Фоновый воркер для выполнения задач по cron-расписанию.
pub struct ScheduledTaskWorker {
    state: AppState,
    registry: Arc<TaskManagerRegistry>,
    logger: Arc<TaskLogger>,
    interval_seconds: u64,
}

impl ScheduledTaskWorker {
    pub fn new(
        state: AppState,
        registry: Arc<TaskManagerRegistry>,
        logger: Arc<TaskLogger>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            state,
            registry,
            logger,
            interval_seconds,
        }
    }

    /// Задачи, время которых наступило; для них сразу считается следующий запуск
    fn take_due(&self, next_runs: &mut HashMap<String, DateTime<Utc>>, now: DateTime<Utc>) -> Vec<String> {
        let mut due = Vec::new();
        for name in self.registry.names() {
            match next_runs.get(&name) {
                Some(next) if *next <= now => {
                    due.push(name.clone());
                    if let Some(following) = self.registry.next_run(&name, now) {
                        next_runs.insert(name, following);
                    }
                }
                Some(_) => {}
                None => {
                    if let Some(first) = self.registry.next_run(&name, now) {
                        info!("Task {} scheduled, first run at {}", name, first);
                        next_runs.insert(name, first);
                    }
                }
            }
        }
        due
    }

    /// Запускает цикл выполнения задач.
    pub async fn run_loop(&self) {
        info!("Scheduled task worker started with interval {} seconds", self.interval_seconds);
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut next_runs: HashMap<String, DateTime<Utc>> = HashMap::new();

        loop {
            interval.tick().await;
            let due = self.take_due(&mut next_runs, Utc::now());
            debug!("{} scheduled task(s) due", due.len());

            for name in due {
                let state = self.state.clone();
                let registry = Arc::clone(&self.registry);
                let logger = Arc::clone(&self.logger);
                tokio::spawn(async move {
                    match service::run_task(&state, &registry, logger, &name).await {
                        Ok(result) => info!("Task {} {}: {}", name, result.status, result.summary),
                        Err(e) => error!("Task {} could not start: {:#}", name, e),
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_take_due_schedules_then_fires() {
        let (state, _mailer) = test_state().await;
        let registry = Arc::new(super::super::initialization::build_registry(&state).unwrap());
        let worker = ScheduledTaskWorker::new(state, registry, Arc::new(TaskLogger::new(&std::env::temp_dir())), 30);

        let mut next_runs = HashMap::new();
        let start = Utc.with_ymd_and_hms(2024, 10, 7, 7, 59, 0).unwrap();
        assert!(worker.take_due(&mut next_runs, start).is_empty());
        assert_eq!(next_runs.len(), 3);
        assert_eq!(next_runs["health_check"], Utc.with_ymd_and_hms(2024, 10, 7, 8, 0, 0).unwrap());

        // 2024-10-07 is a Monday: digest and hourly check both fire at 08:00
        let mut due = worker.take_due(&mut next_runs, Utc.with_ymd_and_hms(2024, 10, 7, 8, 0, 30).unwrap());
        due.sort();
        assert_eq!(due, vec!["health_check".to_string(), "weekly_digest".to_string()]);
        assert_eq!(next_runs["health_check"], Utc.with_ymd_and_hms(2024, 10, 7, 9, 0, 0).unwrap());
    }
}
