use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod db;
mod models;
mod services;

use config::AppConfig;
use services::{notify::Notifier, omdb::OmdbClient};

/// Tracks background task handles for graceful shutdown
struct BackgroundTasks {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.handles.push((name, handle));
    }

    async fn shutdown(self) {
        tracing::info!("Initiating graceful shutdown...");

        self.shutdown.cancel();

        for (name, handle) in self.handles {
            tracing::debug!("Waiting for {} to finish...", name);
            match tokio::time::timeout(Duration::from_secs(10), handle).await {
                Ok(Ok(())) => tracing::debug!("{} finished cleanly", name),
                Ok(Err(e)) => tracing::warn!("{} panicked: {}", name, e),
                Err(_) => tracing::warn!("{} timed out during shutdown", name),
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: AppConfig,
    pub omdb: Option<OmdbClient>,
    pub notifier: Notifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flixgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    config.paths.ensure_dirs().await?;

    config.log_config();

    let database_url = config.database_url();
    tracing::debug!("Database URL: {}", database_url);

    let connect_options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        // WAL keeps readers unblocked while admins mutate
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        // NORMAL sync is safe with WAL and much faster
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(connect_options)
        .await?;

    db::migrate(&pool).await?;

    // Create a default admin account if no users exist; accounts are
    // otherwise managed out-of-band
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    if user_count.0 == 0 {
        tracing::info!("No users found, creating default admin user");
        services::auth::create_user(&pool, "admin", "admin", true).await?;
        tracing::info!("Created default admin user (username: admin, password: admin)");
    }

    let state = Arc::new(AppState {
        db: pool.clone(),
        omdb: config.omdb_api_key.clone().map(OmdbClient::new),
        notifier: Notifier::new(
            config.webhook_logs.clone(),
            config.webhook_suggestions.clone(),
        ),
        config,
    });

    let mut bg_tasks = BackgroundTasks::new();

    // Spawn session sweeper with cancellation support
    {
        let session_pool = pool.clone();
        let cancel = bg_tasks.token();
        bg_tasks.spawn("session-cleanup", async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            tracing::info!("Session cleanup task started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Session cleanup received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(300)) => {
                        match services::auth::cleanup_expired_sessions(&session_pool).await {
                            Ok(removed) if removed > 0 => {
                                tracing::info!("Cleaned up {} expired sessions", removed);
                            }
                            Ok(_) => {}
                            Err(e) => tracing::warn!("Session cleanup failed: {:#}", e),
                        }
                    }
                }
            }
        });
    }

    // Root handler doubles as the login landing probe
    async fn root_handler() -> &'static str {
        "flixgate"
    }

    // Build router
    let app = Router::new()
        .route("/", get(root_handler).head(root_handler))
        .route("/health", get(|| async { "OK" }))
        .merge(api::routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = SocketAddr::new(state.config.bind_address.parse()?, state.config.port);
    tracing::info!("Starting server on {}", addr);

    // Create shutdown signal listener
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        }
    };

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // After the server stops, wind down background tasks
    bg_tasks.shutdown().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}
