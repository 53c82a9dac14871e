#![allow(
    clippy::useless_format,
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::derivable_impls
)]

pub mod dashboards;
pub mod domain;
pub mod handlers;
pub mod projections;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::http::{header, Method};
use axum::middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::shared::config::{self, Config};
use crate::shared::data::db::{self, AppState};
use crate::system::auth::csrf::CSRF_HEADER;

async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let db_path = config::get_database_path(&config);
    let db = db::connect(&db_path).await?;
    let jwt_secret = system::auth::jwt::load_or_create_secret(&db).await?;
    let mailer = shared::mailer::from_config(config.email.as_ref())?;

    Ok(AppState {
        db,
        config: Arc::new(config),
        jwt_secret: Arc::new(jwt_secret),
        mailer,
    })
}

/// `backend task <name>`: runs one scheduled task and exits
async fn run_task_command(state: &AppState, name: Option<&str>) -> anyhow::Result<()> {
    let registry = system::tasks::initialization::build_registry(state)?;
    let Some(name) = name else {
        println!("Usage: backend task <name>");
        for task in registry.list(chrono::Utc::now()) {
            println!("  {:<15} {} [{}]", task.name, task.description, task.schedule_cron.unwrap_or_default());
        }
        return Ok(());
    };

    let logger = system::tasks::initialization::task_logger(state);
    let result = system::tasks::service::run_task(state, &registry, logger, name).await?;
    println!("{}: {} ({})", result.task, result.status, result.summary);
    if let Some(log_file) = result.log_file {
        println!("Log: {}", log_file);
    }
    if result.status != "completed" {
        anyhow::bail!("Task {} failed", name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;
    let state = build_state(config).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("task") {
        return run_task_command(&state, args.get(1).map(String::as_str)).await;
    }

    // Ensure admin user exists
    system::initialization::ensure_admin_user_exists(&state.db).await?;

    if state.config.tasks.enabled {
        let worker = system::tasks::initialization::initialize_scheduled_tasks(&state)?;
        tokio::spawn(async move { worker.run_loop().await });
    } else {
        tracing::info!("Scheduled tasks are disabled in config");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::HeaderName::from_static(CSRF_HEADER),
        ]);

    let static_dir = config::resolve_path(&state.config.server.static_dir);
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("Invalid [server] host/port")?;

    let app = routes::configure_routes(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(system::middleware::request_logger::request_logger))
        .layer(cors);

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
