//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::locations::LocationMapping;
use crate::sessions::SessionStorage;
use crate::shopify::AdminClient;
use crate::tokens::{Clock, TokenResolver};

/// Upper bound for establishing an outbound connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the token resolver and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProxyConfig,
    admin: AdminClient,
    tokens: TokenResolver,
    sessions: Arc<dyn SessionStorage>,
    locations: LocationMapping,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("tokens", &self.inner.tokens)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Proxy configuration
    /// * `http` - Shared outbound HTTP client (see [`http_client`])
    /// * `sessions` - Session storage for the offline strategy and webhooks
    /// * `clock` - Clock driving the client-credentials token cache
    #[must_use]
    pub fn new(
        config: ProxyConfig,
        http: reqwest::Client,
        sessions: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let admin = AdminClient::new(http.clone(), &config.shopify);
        let tokens = TokenResolver::from_config(&config, http, Arc::clone(&sessions), clock);
        let locations = LocationMapping::from(config.locations);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                admin,
                tokens,
                sessions,
                locations,
            }),
        }
    }

    /// Get a reference to the proxy configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn admin(&self) -> &AdminClient {
        &self.inner.admin
    }

    /// Get a reference to the access token resolver.
    #[must_use]
    pub fn tokens(&self) -> &TokenResolver {
        &self.inner.tokens
    }

    /// Get a reference to the session storage.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStorage {
        self.inner.sessions.as_ref()
    }

    /// Get the warehouse location mapping.
    #[must_use]
    pub fn locations(&self) -> LocationMapping {
        self.inner.locations
    }
}

/// Build the outbound HTTP client shared by the token exchange and the
/// Admin API client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .user_agent(concat!("stock-proxy/", env!("CARGO_PKG_VERSION")))
        .build()
}
