//! Session storage written by the app's install flow.
//!
//! # Table: `shopify_sessions`
//!
//! One row per OAuth session. Offline sessions (`is_online = false`) carry the
//! long-lived Admin API token used by the offline-session token strategy.
//! The proxy only reads sessions, except on `app/uninstalled` where every
//! session for the shop is deleted.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/proxy/migrations/` and run via:
//! ```bash
//! cargo run -p stock-proxy-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use stock_proxy_core::ShopDomain;
use thiserror::Error;

pub use memory::MemorySessionStorage;
pub use postgres::PgSessionStorage;

/// Errors that can occur during session storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// A stored Shopify session.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct StoredSession {
    /// Session ID (`offline_{shop}` for offline sessions).
    pub id: String,
    /// Shop domain the session belongs to.
    pub shop: ShopDomain,
    /// Online (per-user) or offline (per-shop) session.
    pub is_online: bool,
    /// Granted scopes, comma separated.
    pub scope: Option<String>,
    /// Admin API access token (may be empty for incomplete installs).
    pub access_token: SecretString,
}

impl StoredSession {
    /// Whether this session can serve the offline-session token strategy.
    #[must_use]
    pub fn is_usable_offline(&self) -> bool {
        !self.is_online && !self.access_token.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .field("scope", &self.scope)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// The one contract the proxy has with session storage.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// All sessions stored for `shop`, in storage order.
    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<StoredSession>, RepositoryError>;

    /// Delete every session for `shop`, returning how many were removed.
    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(is_online: bool, token: &str) -> StoredSession {
        StoredSession {
            id: "offline_shop.myshopify.com".to_string(),
            shop: ShopDomain::parse("shop.myshopify.com").unwrap(),
            is_online,
            scope: Some("read_inventory".to_string()),
            access_token: SecretString::from(token),
        }
    }

    #[test]
    fn test_is_usable_offline() {
        assert!(session(false, "shpat_abc").is_usable_offline());
        assert!(!session(true, "shpat_abc").is_usable_offline());
        assert!(!session(false, "").is_usable_offline());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", session(false, "shpat_very_secret"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_very_secret"));
    }
}
