use chrono::{DateTime, Utc};
use contracts::system::tasks::TaskInfo;
use cron::Schedule;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use super::manager::TaskManager;

struct Registered {
    manager: Arc<dyn TaskManager>,
    cron: Option<String>,
    schedule: Option<Schedule>,
}

/// Реестр менеджеров задач.
/// Хранит реализации TaskManager вместе с расписанием и выдает их по имени.
pub struct TaskManagerRegistry {
    managers: BTreeMap<String, Registered>,
}

impl TaskManagerRegistry {
    pub fn new() -> Self {
        Self {
            managers: BTreeMap::new(),
        }
    }

    /// Регистрирует менеджер; `cron` = None значит "только ручной запуск".
    /// Ошибка только при неверном cron-выражении.
    pub fn register<T: TaskManager + 'static>(&mut self, manager: T, cron: Option<&str>) -> anyhow::Result<()> {
        let schedule = match cron {
            Some(expr) => Some(
                Schedule::from_str(expr)
                    .map_err(|e| anyhow::anyhow!("Invalid cron '{}' for {}: {}", expr, manager.task_type(), e))?,
            ),
            None => None,
        };
        self.managers.insert(
            manager.task_type().to_string(),
            Registered {
                manager: Arc::new(manager),
                cron: cron.map(String::from),
                schedule,
            },
        );
        Ok(())
    }

    /// Возвращает менеджер задач по его имени.
    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskManager>> {
        self.managers.get(task_type).map(|r| Arc::clone(&r.manager))
    }

    pub fn names(&self) -> Vec<String> {
        self.managers.keys().cloned().collect()
    }

    /// Ближайший запуск строго после `after`
    pub fn next_run(&self, task_type: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.managers
            .get(task_type)?
            .schedule
            .as_ref()?
            .after(&after)
            .next()
    }

    pub fn list(&self, now: DateTime<Utc>) -> Vec<TaskInfo> {
        self.managers
            .iter()
            .map(|(name, r)| TaskInfo {
                name: name.clone(),
                description: r.manager.description().to_string(),
                schedule_cron: r.cron.clone(),
                next_run_at: self.next_run(name, now),
            })
            .collect()
    }
}

impl Default for TaskManagerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
