use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::dashboards::d400_system_health::{metrics::format_uptime, service as health_service};
use crate::shared::data::db::AppState;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;

/// Ежечасная проверка состояния; при превышении порогов письмо администраторам
pub struct HealthCheckManager;

#[async_trait]
impl TaskManager for HealthCheckManager {
    fn task_type(&self) -> &'static str {
        "health_check"
    }

    fn description(&self) -> &'static str {
        "Collect system metrics and alert on threshold breaches"
    }

    async fn run(&self, state: &AppState, session_id: &str, logger: Arc<TaskLogger>) -> Result<String> {
        let health = health_service::collect(&state.db, &state.config).await?;

        let load = health
            .load_average
            .map(|l| format!("{:.2}/{:.2}/{:.2}", l.one, l.five, l.fifteen))
            .unwrap_or_else(|| "n/a".into());
        let memory = health
            .memory
            .map(|m| format!("{:.1}%", m.used_percent))
            .unwrap_or_else(|| "n/a".into());
        let uptime = health.uptime_seconds.map(format_uptime).unwrap_or_else(|| "n/a".into());
        logger.write_log(
            session_id,
            &format!("load {}, memory {}, uptime {}, db {:?} bytes", load, memory, uptime, health.db_size_bytes),
        )?;

        if health.alerts.is_empty() {
            return Ok(format!("Healthy: load {}, memory {}", load, memory));
        }

        for alert in &health.alerts {
            logger.write_log(session_id, &format!("ALERT: {}", alert))?;
        }
        let recipients = state.mailer.admin_recipients();
        if recipients.is_empty() {
            logger.write_log(session_id, "No alert recipients configured")?;
        } else {
            let body = format!(
                "Community Hub health check at {}\n\n{}\n\nLoad: {}\nMemory: {}\nUptime: {}\n",
                health.generated_at,
                health
                    .alerts
                    .iter()
                    .map(|a| format!("- {}", a))
                    .collect::<Vec<_>>()
                    .join("\n"),
                load,
                memory,
                uptime
            );
            state
                .mailer
                .send(&recipients, "Community Hub: health alert", &body)
                .await?;
        }
        Ok(format!("{} alert(s): {}", health.alerts.len(), health.alerts.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::logger::repository::log_event;
    use crate::system::tasks::initialization::{build_registry, task_logger};
    use crate::system::tasks::service::run_task;
    use crate::test_support::test_state_with;

    #[tokio::test]
    async fn test_alert_is_mailed() {
        let (state, mailer) = test_state_with(|config| config.health.max_errors_per_day = 0).await;
        log_event(&state.db, "server", "test", "error", "boom").await.unwrap();

        let registry = build_registry(&state).unwrap();
        let result = run_task(&state, &registry, task_logger(&state), "health_check").await.unwrap();
        assert_eq!(result.status, "completed");
        assert!(result.summary.contains("errors logged"));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["ops@example.com".to_string()]);
        assert!(sent[0].1.contains("health alert"));
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let (state, _mailer) = test_state_with(|_| {}).await;
        let registry = build_registry(&state).unwrap();
        assert!(run_task(&state, &registry, task_logger(&state), "nope").await.is_err());
    }
}
