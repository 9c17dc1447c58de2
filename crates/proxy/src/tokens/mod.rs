//! Admin API access token resolution.
//!
//! Three strategies are supported, selected once at startup:
//!
//! - **static**: a fixed token from configuration, used for the configured store.
//! - **client credentials**: exchanged for the configured store and cached
//!   in memory until a minute before expiry.
//! - **offline session**: looked up per shop in the session database.

pub mod cache;
pub mod client_credentials;
pub mod offline;

use std::sync::Arc;

use secrecy::SecretString;
use stock_proxy_core::ShopDomain;
use thiserror::Error;

pub use cache::{CachedToken, Clock, ManualClock, SystemClock, TokenCache};
pub use client_credentials::ClientCredentials;
pub use offline::OfflineSessions;

use crate::config::{ProxyConfig, TokenStrategyConfig, TokenStrategyKind};
use crate::sessions::SessionStorage;

/// Errors raised while resolving an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No usable offline session is stored for the shop.
    #[error("no offline session for {shop}")]
    NoOfflineSession { shop: ShopDomain },

    /// The client-credentials exchange was rejected or returned no token.
    #[error("token exchange failed: {status} {status_text}")]
    Exchange {
        status: u16,
        status_text: String,
        body: String,
    },

    /// Transport failure talking to Shopify.
    #[error("token exchange request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Access token resolver for the configured strategy.
pub enum TokenResolver {
    Static(SecretString),
    ClientCredentials(ClientCredentials),
    OfflineSession(OfflineSessions),
}

impl std::fmt::Debug for TokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.debug_tuple("Static").field(&"[REDACTED]").finish(),
            Self::ClientCredentials(source) => {
                f.debug_tuple("ClientCredentials").field(source).finish()
            }
            Self::OfflineSession(lookup) => f.debug_tuple("OfflineSession").field(lookup).finish(),
        }
    }
}

impl TokenResolver {
    /// Build the resolver selected by `config.tokens`.
    ///
    /// The client-credentials strategy is bound to `config.shopify.store`.
    #[must_use]
    pub fn from_config(
        config: &ProxyConfig,
        client: reqwest::Client,
        sessions: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        match &config.tokens {
            TokenStrategyConfig::Static { access_token } => Self::Static(access_token.clone()),
            TokenStrategyConfig::ClientCredentials {
                client_id,
                client_secret,
            } => Self::ClientCredentials(ClientCredentials::new(
                client,
                config.shopify.store.clone(),
                config.shopify.admin_origin.as_ref(),
                client_id.clone(),
                client_secret.clone(),
                TokenCache::new(clock),
            )),
            TokenStrategyConfig::OfflineSession { .. } => {
                Self::OfflineSession(OfflineSessions::new(sessions))
            }
        }
    }

    /// Which strategy this resolver implements.
    #[must_use]
    pub const fn kind(&self) -> TokenStrategyKind {
        match self {
            Self::Static(_) => TokenStrategyKind::Static,
            Self::ClientCredentials(_) => TokenStrategyKind::ClientCredentials,
            Self::OfflineSession(_) => TokenStrategyKind::OfflineSession,
        }
    }

    /// Whether requests must name their shop explicitly.
    ///
    /// Offline sessions are per shop, so the configured store is never used
    /// as a fallback.
    #[must_use]
    pub const fn requires_shop(&self) -> bool {
        matches!(self, Self::OfflineSession(_))
    }

    /// Resolve an Admin API access token for `shop`.
    ///
    /// Static and client-credentials tokens belong to the configured store;
    /// callers only pass that store for them.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if no token can be produced.
    pub async fn resolve(&self, shop: &ShopDomain) -> Result<SecretString, TokenError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ClientCredentials(source) => source.resolve().await,
            Self::OfflineSession(lookup) => lookup.resolve(shop).await,
        }
    }

    /// Forget any cached token for `shop`.
    pub async fn invalidate(&self, shop: &ShopDomain) {
        if let Self::ClientCredentials(source) = self
            && source.shop() == shop
        {
            source.invalidate().await;
            tracing::info!(shop = %shop, "Cleared cached client-credentials token");
        }
    }
}
