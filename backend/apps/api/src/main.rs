//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, http,
    http::{Method, header},
};
use chrono::Utc;
use dispatch::application::dispatcher::DispatchStore;
use dispatch::{
    CommandDispatcher, HmacTokenVerifier, HttpProviders, InMemoryDispatchRepository,
    PgDispatchRepository, dispatch_router,
};
use platform::rate_limit::SlidingWindowRateLimiter;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,dispatch=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    match config.database_url.clone() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repository = PgDispatchRepository::new(pool);

            // Startup cleanup: errors here should not prevent server startup
            if let Some(days) = config.audit_retention_days {
                let cutoff = Utc::now() - chrono::Duration::days(days);
                if let Err(e) = repository.purge_before(cutoff).await {
                    tracing::warn!(
                        error = %e,
                        "Audit log cleanup failed, continuing anyway"
                    );
                }
            }

            serve(config, Arc::new(repository)).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, audit log is kept in memory only");
            serve(config, Arc::new(InMemoryDispatchRepository::new())).await
        }
    }
}

async fn serve<S>(config: ServerConfig, store: Arc<S>) -> anyhow::Result<()>
where
    S: DispatchStore,
{
    tracing::info!(
        max_emails = config.dispatch.email_rate_limit.max_requests,
        window_secs = config.dispatch.email_rate_limit.window.as_secs(),
        provider_timeout_secs = config.providers.timeout_secs(),
        "Dispatch configuration loaded"
    );

    let providers = Arc::new(HttpProviders::new(config.providers.clone())?);
    let limiter = Arc::new(SlidingWindowRateLimiter::new());
    let dispatch_config = Arc::new(config.dispatch.clone());

    // Idle quota keys would otherwise accumulate for every caller ever seen
    {
        let limiter = limiter.clone();
        let rate_limit = config.dispatch.email_rate_limit.clone();
        let mut interval = tokio::time::interval(config.limiter_sweep_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                limiter.evict_idle(&rate_limit);
            }
        });
    }

    let dispatcher = CommandDispatcher::new(store, providers, limiter, dispatch_config);
    let verifier = Arc::new(HmacTokenVerifier::new(config.identity_secret.clone()));

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", dispatch_router(dispatcher, verifier))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
