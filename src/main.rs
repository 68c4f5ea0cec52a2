use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatwatch::api::router;
use seatwatch::notify::{EmailConfig, EmailNotifier, LogNotifier, Notifier};
use seatwatch::services::{MonitorScheduler, MonitorService};
use seatwatch::state::AppState;
use seatwatch::websoc::{CatalogClient, WebSocConfig, WebSocHttpClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seatwatch=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://seatwatch.db".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let catalog: Arc<dyn CatalogClient> =
        Arc::new(WebSocHttpClient::new(WebSocConfig::new_from_env())?);

    let notifier: Arc<dyn Notifier> = if std::env::var("SMTP_HOST").is_ok() {
        Arc::new(EmailNotifier::new(EmailConfig::new_from_env()?)?)
    } else {
        info!("SMTP_HOST not set, notifications will only be logged");
        Arc::new(LogNotifier)
    };

    let interval_secs = std::env::var("MONITOR_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);

    let shutdown = Arc::new(Notify::new());
    let monitor = MonitorService::new(pool.clone(), catalog.clone(), notifier.clone());
    let scheduler = MonitorScheduler::new(monitor, interval_secs, shutdown.clone());
    let scheduler_task = tokio::spawn(scheduler.start());

    let state = AppState {
        db: pool.clone(),
        catalog,
        notifier,
    };

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.notify_one();
    scheduler_task.await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c");
    }
}
