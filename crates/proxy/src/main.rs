//! Stock Proxy - Shopify App Proxy inventory service.
//!
//! Serves `/proxy/inventory` behind a Shopify App Proxy, plus the
//! `app/uninstalled` webhook.
//!
//! # Session storage
//!
//! The offline-session strategy reads `shopify_sessions` from `PostgreSQL`.
//! Other strategies keep an in-memory store so the uninstall webhook still
//! answers.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use stock_proxy::config::{ProxyConfig, TokenStrategyConfig};
use stock_proxy::sessions::{self, MemorySessionStorage, PgSessionStorage, SessionStorage};
use stock_proxy::state::{AppState, http_client};
use stock_proxy::tokens::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ProxyConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Session storage for the configured token strategy.
async fn session_storage(config: &ProxyConfig) -> Result<Arc<dyn SessionStorage>, sqlx::Error> {
    match &config.tokens {
        TokenStrategyConfig::OfflineSession { database_url } => {
            let pool = sessions::create_pool(database_url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgSessionStorage::new(pool)))
        }
        _ => Ok(Arc::new(MemorySessionStorage::new())),
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ProxyConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stock_proxy=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if config
        .shopify
        .api_secret
        .as_ref()
        .is_none_or(|s| s.expose_secret().is_empty())
    {
        tracing::warn!("SHOPIFY_API_SECRET is not set; every signed request will fail with 500");
    }
    if !stock_proxy::locations::LocationMapping::from(config.locations).is_complete() {
        tracing::warn!("UK_LOCATION_ID or US_LOCATION_ID is not set");
    }

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p stock-proxy-cli -- migrate
    let sessions = session_storage(&config)
        .await
        .expect("Failed to create session storage");

    let http = http_client(config.upstream_timeout).expect("Failed to build HTTP client");
    let state = AppState::new(config.clone(), http, sessions, Arc::new(SystemClock));
    tracing::info!(strategy = ?state.tokens().kind(), "Token strategy selected");

    let app = stock_proxy::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("stock-proxy listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
