//! Proxy configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//!
//! ## Required per token strategy
//! - `static` - `SHOPIFY_ADMIN_ACCESS_TOKEN`
//! - `client_credentials` - `SHOPIFY_CLIENT_ID`, `SHOPIFY_CLIENT_SECRET`
//! - `offline_session` - `DATABASE_URL`
//!
//! ## Checked per request (missing values produce a 500 response)
//! - `SHOPIFY_API_SECRET` - App secret used to sign proxy requests and webhooks
//! - `UK_LOCATION_ID` - Numeric Shopify location ID of the UK warehouse
//! - `US_LOCATION_ID` - Numeric Shopify location ID of the US warehouse
//!
//! ## Optional
//! - `PROXY_HOST` - Bind address (default: 127.0.0.1)
//! - `PROXY_PORT` - Listen port (default: 3000)
//! - `TOKEN_STRATEGY` - `static`, `client_credentials` or `offline_session` (default: static)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2023-04)
//! - `SHOPIFY_ADMIN_ORIGIN` - Override `https://{shop}` (local mocks)
//! - `PROXY_UPSTREAM_TIMEOUT_SECS` - Outbound request timeout (default: 10)
//! - `PROXY_DEBUG_ROUTES` - Enable `/debug/sessions` (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use stock_proxy_core::{LocationId, ShopDomain};
use thiserror::Error;
use url::Url;

/// Admin API version that still exposes `InventoryLevel.available`.
pub const DEFAULT_API_VERSION: &str = "2023-04";

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Proxy application configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify store and Admin API settings
    pub shopify: ShopifyConfig,
    /// Warehouse location IDs
    pub locations: LocationConfig,
    /// Which access token strategy to use, with its credentials
    pub tokens: TokenStrategyConfig,
    /// Upper bound for every outbound HTTP request
    pub upstream_timeout: Duration,
    /// Whether `/debug/sessions` is mounted
    pub debug_routes: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shopify store and Admin API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: ShopDomain,
    /// Admin API version (e.g., 2023-04)
    pub api_version: String,
    /// App secret that signs proxy requests and webhooks
    pub api_secret: Option<SecretString>,
    /// Origin override for all Shopify calls (defaults to `https://{shop}`)
    pub admin_origin: Option<Url>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field(
                "api_secret",
                &self.api_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("admin_origin", &self.admin_origin)
            .finish()
    }
}

/// Warehouse location configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationConfig {
    /// UK warehouse location (also used for unknown countries)
    pub uk: Option<LocationId>,
    /// US warehouse location
    pub us: Option<LocationId>,
}

/// Token strategy selector values accepted in `TOKEN_STRATEGY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStrategyKind {
    Static,
    ClientCredentials,
    OfflineSession,
}

impl std::str::FromStr for TokenStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "static" => Ok(Self::Static),
            "client_credentials" => Ok(Self::ClientCredentials),
            "offline_session" | "offline" => Ok(Self::OfflineSession),
            other => Err(format!(
                "unknown strategy '{other}' (expected static, client_credentials or offline_session)"
            )),
        }
    }
}

/// Access token strategy and the credentials it needs.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub enum TokenStrategyConfig {
    /// A fixed Admin API access token.
    Static { access_token: SecretString },
    /// OAuth client-credentials exchange, cached in memory.
    ClientCredentials {
        client_id: String,
        client_secret: SecretString,
    },
    /// Offline session lookup in the session database.
    OfflineSession { database_url: SecretString },
}

impl std::fmt::Debug for TokenStrategyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { .. } => f
                .debug_struct("Static")
                .field("access_token", &"[REDACTED]")
                .finish(),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::OfflineSession { .. } => f
                .debug_struct("OfflineSession")
                .field("database_url", &"[REDACTED]")
                .finish(),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PROXY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PROXY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_PORT".to_string(), e.to_string()))?;
        let timeout_secs = get_env_or_default(
            "PROXY_UPSTREAM_TIMEOUT_SECS",
            &DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("PROXY_UPSTREAM_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        let debug_routes = parse_bool(&get_env_or_default("PROXY_DEBUG_ROUTES", "false"));

        let shopify = ShopifyConfig::from_env()?;
        let locations = LocationConfig::from_env()?;
        let tokens = TokenStrategyConfig::from_env()?;

        Ok(Self {
            host,
            port,
            shopify,
            locations,
            tokens,
            upstream_timeout: Duration::from_secs(timeout_secs),
            debug_routes,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store_raw = get_required_env("SHOPIFY_STORE")?;
        let store = ShopDomain::parse(&store_raw)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_STORE".to_string(), e.to_string()))?;

        let api_secret = match get_optional_env("SHOPIFY_API_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "SHOPIFY_API_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let admin_origin = get_optional_env("SHOPIFY_ADMIN_ORIGIN")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPIFY_ADMIN_ORIGIN".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            store,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            api_secret,
            admin_origin,
        })
    }
}

impl LocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            uk: get_optional_location("UK_LOCATION_ID")?,
            us: get_optional_location("US_LOCATION_ID")?,
        })
    }
}

impl TokenStrategyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let kind = get_env_or_default("TOKEN_STRATEGY", "static")
            .parse::<TokenStrategyKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("TOKEN_STRATEGY".to_string(), e))?;

        match kind {
            TokenStrategyKind::Static => Ok(Self::Static {
                access_token: get_validated_secret("SHOPIFY_ADMIN_ACCESS_TOKEN")?,
            }),
            TokenStrategyKind::ClientCredentials => Ok(Self::ClientCredentials {
                client_id: get_required_env("SHOPIFY_CLIENT_ID")?,
                client_secret: get_validated_secret("SHOPIFY_CLIENT_SECRET")?,
            }),
            TokenStrategyKind::OfflineSession => Ok(Self::OfflineSession {
                database_url: get_required_secret("DATABASE_URL")?,
            }),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable. Empty values count as missing.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get an optional numeric location ID.
fn get_optional_location(key: &str) -> Result<Option<LocationId>, ConfigError> {
    get_optional_env(key)
        .map(|raw| {
            LocationId::parse(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the value from the Partner Dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ProxyConfig {
        ProxyConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            shopify: ShopifyConfig {
                store: ShopDomain::parse("test.myshopify.com").unwrap(),
                api_version: DEFAULT_API_VERSION.to_string(),
                api_secret: Some(SecretString::from("super_secret_api_value")),
                admin_origin: None,
            },
            locations: LocationConfig::default(),
            tokens: TokenStrategyConfig::ClientCredentials {
                client_id: "client_id_value".to_string(),
                client_secret: SecretString::from("super_secret_client_value"),
            },
            upstream_timeout: Duration::from_secs(10),
            debug_routes: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-secret-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_hex_secret() {
        let result = validate_secret_strength("3f9c1e07b2a84d6590ce17fa2b4d8e61", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_token_strategy_kind_parse() {
        assert_eq!(
            "static".parse::<TokenStrategyKind>(),
            Ok(TokenStrategyKind::Static)
        );
        assert_eq!(
            "Client-Credentials".parse::<TokenStrategyKind>(),
            Ok(TokenStrategyKind::ClientCredentials)
        );
        assert_eq!(
            "offline_session".parse::<TokenStrategyKind>(),
            Ok(TokenStrategyKind::OfflineSession)
        );
        assert!("oauth".parse::<TokenStrategyKind>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool(" YES "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_value"));
        assert!(!debug_output.contains("super_secret_client_value"));
    }
}
