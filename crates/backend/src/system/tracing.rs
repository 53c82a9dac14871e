use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::shared::config::resolve_path;

const DEFAULT_FILTER: &str = "info,sqlx=warn,sea_orm=warn";

/// Инициализация системы трассировки (tracing)
///
/// Логи пишутся в stdout (с цветами) и в `logs/backend.log` рядом с exe (без цветов).
/// Фильтр берётся из `RUST_LOG`.
pub fn initialize() -> anyhow::Result<PathBuf> {
    let log_dir = resolve_path("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Cannot create log directory {}", log_dir.display()))?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("Cannot open log file {}", log_file_path.display()))?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    println!("✓ Log file: {} (filter: {})", log_file_path.display(), filter);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()
        .context("Tracing subscriber is already initialized")?;

    Ok(log_file_path)
}
