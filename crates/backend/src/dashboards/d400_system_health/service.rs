use chrono::Utc;
use contracts::dashboards::d400_system_health::{EntityCounts, SystemHealth};
use sea_orm::DatabaseConnection;

use super::metrics;
use crate::domain::{
    a001_community, a002_lottery_event, a003_lottery_book, a005_payment_collection, a008_csf_member,
    a009_csf_payment, a010_deletion_request,
};
use crate::shared::config::{get_database_path, get_storage_path, Config, HealthConfig};
use crate::shared::data::db::database_file_size;
use crate::shared::logger::repository as log_repository;
use crate::system::tasks::managers::log_clean;
use crate::system::users::repository as user_repository;

async fn entity_counts(db: &DatabaseConnection) -> anyhow::Result<EntityCounts> {
    Ok(EntityCounts {
        communities: a001_community::repository::count(db).await? as i64,
        users: user_repository::count_users(db).await?,
        lottery_events: a002_lottery_event::repository::count(db).await? as i64,
        books: a003_lottery_book::repository::count(db).await? as i64,
        payments: a005_payment_collection::repository::count(db).await? as i64,
        csf_members: a008_csf_member::repository::count(db).await? as i64,
        csf_payments: a009_csf_payment::repository::count(db).await? as i64,
        pending_deletion_requests: a010_deletion_request::repository::count_pending(db).await? as i64,
    })
}

/// Threshold breaches of a snapshot
pub fn evaluate_alerts(health: &SystemHealth, thresholds: &HealthConfig) -> Vec<String> {
    let mut alerts = Vec::new();
    if let Some(load) = health.load_average {
        if load.one > thresholds.max_load_average {
            alerts.push(format!(
                "Load average {:.2} is above {:.2}",
                load.one, thresholds.max_load_average
            ));
        }
    }
    if let Some(mem) = health.memory {
        if mem.used_percent > thresholds.max_memory_percent {
            alerts.push(format!(
                "Memory usage {:.1}% is above {:.1}%",
                mem.used_percent, thresholds.max_memory_percent
            ));
        }
    }
    let errors: i64 = health
        .log_counts_24h
        .iter()
        .filter(|c| c.level == "error")
        .map(|c| c.count)
        .sum();
    if errors > thresholds.max_errors_per_day {
        alerts.push(format!(
            "{} errors logged in the last 24h (limit {})",
            errors, thresholds.max_errors_per_day
        ));
    }
    alerts
}

/// Снимок состояния системы для админ-панели и задачи health_check
pub async fn collect(db: &DatabaseConnection, config: &Config) -> anyhow::Result<SystemHealth> {
    let mut health = SystemHealth {
        generated_at: Utc::now().to_rfc3339(),
        load_average: metrics::load_average(),
        memory: metrics::memory(),
        uptime_seconds: metrics::uptime_seconds(),
        db_size_bytes: database_file_size(&get_database_path(config)),
        log_counts_24h: log_repository::count_by_level_since(db, 24).await?,
        last_log_clean: log_clean::read_marker(&get_storage_path(config)),
        counts: entity_counts(db).await?,
        recent_errors: log_repository::recent_errors(db, 10).await?,
        alerts: Vec::new(),
    };
    health.alerts = evaluate_alerts(&health, &config.health);
    Ok(health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::{parse_config, DEFAULT_CONFIG};
    use crate::shared::data::db::connect_in_memory;
    use crate::test_support::seed_community;
    use contracts::dashboards::d400_system_health::{LoadAverage, LogLevelCount};

    #[tokio::test]
    async fn test_collect_counts() {
        let db = connect_in_memory().await.unwrap();
        seed_community(&db, "health").await;
        log_repository::log_event(&db, "server", "test", "error", "boom").await.unwrap();

        let config = parse_config(DEFAULT_CONFIG).unwrap();
        let health = collect(&db, &config).await.unwrap();
        assert_eq!(health.counts.communities, 1);
        assert_eq!(health.recent_errors.len(), 1);
        assert!(health.log_counts_24h.iter().any(|c| c.level == "error" && c.count == 1));
    }

    #[test]
    fn test_alerts() {
        let thresholds = HealthConfig {
            max_load_average: 2.0,
            max_memory_percent: 90.0,
            max_errors_per_day: 5,
            log_retention_days: 30,
        };
        let mut health = SystemHealth {
            generated_at: String::new(),
            load_average: Some(LoadAverage { one: 3.5, five: 1.0, fifteen: 1.0 }),
            memory: None,
            uptime_seconds: None,
            db_size_bytes: None,
            log_counts_24h: vec![LogLevelCount { level: "error".into(), count: 6 }],
            last_log_clean: None,
            counts: EntityCounts::default(),
            recent_errors: vec![],
            alerts: vec![],
        };
        assert_eq!(evaluate_alerts(&health, &thresholds).len(), 2);

        health.load_average = Some(LoadAverage { one: 0.5, five: 0.5, fifteen: 0.5 });
        health.log_counts_24h.clear();
        assert!(evaluate_alerts(&health, &thresholds).is_empty());
    }
}
