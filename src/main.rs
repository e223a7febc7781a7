//! SisBib Server - Library Management Backend
//!
//! REST API for the library catalog, pickup requests, loans and sanctions.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use chrono::NaiveTime;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sisbib_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{
        email::SmtpMailer,
        notifications::spawn_weekly_sweep,
        release::ReleaseScheduler,
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting SisBib Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect_with(config.database.connect_options())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        "Connected to database {} on {}:{}",
        config.database.name,
        config.database.host,
        config.database.port
    );

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool);
    let release = ReleaseScheduler::new(
        Arc::new(repository.copies.clone()),
        config.loans.release_delay_minutes,
    );
    let mailer = Arc::new(SmtpMailer::new(config.email.clone()));
    let services = Services::new(repository, release.clone(), mailer, &config);

    let weekly_sweep = if config.notifications.weekly_enabled {
        let weekday = config.notifications.weekday()?;
        let at = NaiveTime::from_hms_opt(config.notifications.hour, 0, 0)
            .context("Invalid notifications.hour")?;
        tracing::info!("Weekly overdue sweep every {} at {} UTC", weekday, at);
        Some(spawn_weekly_sweep(services.notifications.clone(), weekday, at))
    } else {
        tracing::info!("Weekly overdue sweep disabled");
        None
    };

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = weekly_sweep {
        task.abort();
    }
    release.shutdown();

    tracing::info!("SisBib Server stopped");
    Ok(())
}

/// Pretty or JSON logs, filtered by RUST_LOG or the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("sisbib_server={},tower_http=info", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", api::routes().with_state(state))
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => tracing::info!("Received SIGTERM, starting shutdown..."),
    }
}
