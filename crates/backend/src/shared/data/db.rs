use anyhow::Context;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;
use std::sync::Arc;

use crate::shared::config::Config;
use crate::shared::mailer::Mailer;

/// Embedded schema; every statement is `IF NOT EXISTS`
const SCHEMA_SQL: &str = include_str!("../../../migrations/001_schema.sql");

/// Shared handles passed to every handler through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub jwt_secret: Arc<String>,
    pub mailer: Arc<dyn Mailer>,
}

fn build_sqlite_url(path: &Path) -> String {
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    format!("sqlite://{}{}?mode=rwc", prefix, normalized)
}

/// Opens (creating if needed) the SQLite file and applies the schema
pub async fn connect(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db_url = build_sqlite_url(db_file);
    tracing::info!("Opening database {}", db_file.display());

    let mut options = ConnectOptions::new(db_url);
    options
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(|opts| opts.foreign_keys(true));
    let conn = Database::connect(options).await.context("connecting to SQLite")?;

    apply_schema(&conn).await?;
    Ok(conn)
}

/// In-memory database used by tests; one connection so the data survives
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(|opts| opts.foreign_keys(true));
    let conn = Database::connect(options).await?;
    apply_schema(&conn).await?;
    Ok(conn)
}

pub async fn apply_schema<C: ConnectionTrait>(conn: &C) -> anyhow::Result<()> {
    // Execute each statement separately (SQLite doesn't support execute_batch in sea-orm)
    for (idx, statement) in split_statements(SCHEMA_SQL).into_iter().enumerate() {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("{};", statement),
        ))
        .await
        .with_context(|| {
            format!(
                "Failed to execute schema statement #{}: {}",
                idx,
                statement.lines().take(2).collect::<Vec<_>>().join(" ")
            )
        })?;
    }

    tracing::debug!("Database schema is up to date");
    Ok(())
}

/// Drops `--` comments first, then splits the script on `;`
fn split_statements(sql: &str) -> Vec<String> {
    let code = sql
        .lines()
        .map(|line| match line.find("--") {
            Some(pos) => line[..pos].trim_end(),
            None => line.trim_end(),
        })
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .map(|statement| statement.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Database file size, used by the health dashboard
pub fn database_file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
