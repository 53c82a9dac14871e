use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory for task logs and the log-clean marker
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "storage".to_string(),
        }
    }
}

/// SMTP settings; without this section mail is silently skipped
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    /// Recipients of alerts and digests
    #[serde(default)]
    pub admin_recipients: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_load_threshold")]
    pub max_load_average: f64,
    #[serde(default = "default_memory_threshold")]
    pub max_memory_percent: f64,
    #[serde(default = "default_error_threshold")]
    pub max_errors_per_day: i64,
    #[serde(default = "default_log_retention")]
    pub log_retention_days: i64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_load_average: default_load_threshold(),
            max_memory_percent: default_memory_threshold(),
            max_errors_per_day: default_error_threshold(),
            log_retention_days: default_log_retention(),
        }
    }
}

fn default_load_threshold() -> f64 {
    4.0
}

fn default_memory_threshold() -> f64 {
    90.0
}

fn default_error_threshold() -> i64 {
    50
}

fn default_log_retention() -> i64 {
    30
}

/// Cron expressions (seconds first, as the `cron` crate expects)
#[derive(Debug, Deserialize, Clone)]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_health_cron")]
    pub health_check: String,
    #[serde(default = "default_digest_cron")]
    pub weekly_digest: String,
    #[serde(default = "default_log_clean_cron")]
    pub log_clean: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            health_check: default_health_cron(),
            weekly_digest: default_digest_cron(),
            log_clean: default_log_clean_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_health_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_digest_cron() -> String {
    "0 0 8 * * Mon".to_string()
}

fn default_log_clean_cron() -> String {
    "0 30 2 * * *".to_string()
}

/// Default configuration embedded in the binary
pub const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
static_dir = "dist"

[database]
path = "data/community_hub.db"

[storage]
path = "storage"

[health]
max_load_average = 4.0
max_memory_percent = 90.0
max_errors_per_day = 50
log_retention_days = 30

[tasks]
enabled = true
health_check = "0 0 * * * *"
weekly_digest = "0 0 8 * * Mon"
log_clean = "0 30 2 * * *"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Current working directory
/// 3. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut candidates = Vec::new();
    if let Some(exe_dir) = exe_dir() {
        candidates.push(exe_dir.join("config.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config.toml"));
    }

    for config_path in candidates {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            return parse_config(&contents)
                .with_context(|| format!("parsing {}", config_path.display()));
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

/// Resolves relative paths against the executable directory
pub fn resolve_path(path_str: &str) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match exe_dir() {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path_str),
    }
}

/// Get the database file path from configuration
pub fn get_database_path(config: &Config) -> PathBuf {
    resolve_path(&config.database.path)
}

pub fn get_storage_path(config: &Config) -> PathBuf {
    resolve_path(&config.storage.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "data/community_hub.db");
        assert_eq!(config.server.port, 3000);
        assert!(config.email.is_none());
        assert_eq!(config.tasks.health_check, "0 0 * * * *");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(
            r#"
[database]
path = "/tmp/x.db"

[email]
smtp_host = "smtp.example.com"
from = "hub@example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.path, "storage");
        assert_eq!(config.health.log_retention_days, 30);
        let email = config.email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert!(email.admin_recipients.is_empty());
        assert_eq!(get_database_path(&parse_config(DEFAULT_CONFIG).unwrap()).file_name().unwrap(), "community_hub.db");
    }
}
