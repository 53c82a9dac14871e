use chrono::{Duration, Utc};
use contracts::dashboards::d400_system_health::LogLevelCount;
use contracts::shared::logger::{LogEntry, LogQuery};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryOrder, QuerySelect, Set,
    Statement,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "system_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: String,
    pub source: String,
    pub category: String,
    pub level: String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.id,
            timestamp: m.timestamp,
            source: m.source,
            category: m.category,
            level: m.level,
            message: m.message,
        }
    }
}

/// Добавить запись в лог без ожидания (ошибки только в tracing)
pub fn log_event_internal(
    db: &DatabaseConnection,
    source: &str,
    category: &str,
    level: &str,
    message: &str,
) {
    let db = db.clone();
    let source = source.to_string();
    let category = category.to_string();
    let level = level.to_string();
    let message = message.to_string();

    tokio::spawn(async move {
        if let Err(e) = log_event(&db, &source, &category, &level, &message).await {
            tracing::warn!("Failed to log event: {}", e);
        }
    });
}

/// Добавить запись в лог
pub async fn log_event<C: ConnectionTrait>(
    conn: &C,
    source: &str,
    category: &str,
    level: &str,
    message: &str,
) -> anyhow::Result<()> {
    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        timestamp: Set(now),
        source: Set(source.to_string()),
        category: Set(category.to_string()),
        level: Set(level.to_string()),
        message: Set(message.to_string()),
    };

    active.insert(conn).await?;
    Ok(())
}

/// Записи лога, новые сверху
pub async fn list_logs<C: ConnectionTrait>(conn: &C, query: &LogQuery) -> anyhow::Result<Vec<LogEntry>> {
    let mut select = Entity::find().order_by_desc(Column::Id);
    if let Some(level) = query.level.as_ref().filter(|l| !l.is_empty()) {
        select = select.filter(Column::Level.eq(level.clone()));
    }
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        select = select.filter(Column::Category.eq(category.clone()));
    }
    let logs = select
        .limit(query.limit.unwrap_or(500))
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(logs)
}

/// Очистить все записи лога
pub async fn clear_all_logs<C: ConnectionTrait>(conn: &C) -> anyhow::Result<u64> {
    let res = Entity::delete_many().exec(conn).await?;
    Ok(res.rows_affected)
}

/// Удалить записи старше `days` дней
pub async fn delete_older_than<C: ConnectionTrait>(conn: &C, days: i64) -> anyhow::Result<u64> {
    let cutoff = (Utc::now() - Duration::days(days))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let res = Entity::delete_many()
        .filter(Column::Timestamp.lt(cutoff))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

#[derive(Debug, FromQueryResult)]
struct LevelCountRow {
    level: String,
    cnt: i64,
}

pub async fn count_by_level_since<C: ConnectionTrait>(
    conn: &C,
    hours: i64,
) -> anyhow::Result<Vec<LogLevelCount>> {
    let cutoff = (Utc::now() - Duration::hours(hours))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let rows = LevelCountRow::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT level, COUNT(*) AS cnt FROM system_log WHERE timestamp >= ? GROUP BY level ORDER BY level",
        [cutoff.into()],
    ))
    .all(conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| LogLevelCount {
            level: r.level,
            count: r.cnt,
        })
        .collect())
}

pub async fn recent_errors<C: ConnectionTrait>(conn: &C, limit: u64) -> anyhow::Result<Vec<LogEntry>> {
    let logs = Entity::find()
        .filter(Column::Level.eq("error"))
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_log_filter_and_counts() {
        let db = connect_in_memory().await.unwrap();
        log_event(&db, "server", "auth", "info", "login").await.unwrap();
        log_event(&db, "server", "lottery", "error", "boom").await.unwrap();
        log_event(&db, "task", "health", "error", "load high").await.unwrap();

        let errors = list_logs(
            &db,
            &LogQuery {
                level: Some("error".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "load high");

        let counts = count_by_level_since(&db, 24).await.unwrap();
        let error_count = counts.iter().find(|c| c.level == "error").map(|c| c.count);
        assert_eq!(error_count, Some(2));

        assert_eq!(delete_older_than(&db, 1).await.unwrap(), 0);
        assert_eq!(clear_all_logs(&db).await.unwrap(), 3);
    }
}
