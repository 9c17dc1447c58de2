//! Integration tests for the stock proxy.
//!
//! The full router is driven in-process with `tower::ServiceExt::oneshot`.
//! Shopify (token endpoint and Admin GraphQL) is a `wiremock` server reached
//! through `SHOPIFY_ADMIN_ORIGIN`-style origin overrides, so no network or
//! database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stock-proxy-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use stock_proxy::config::{LocationConfig, ProxyConfig, ShopifyConfig, TokenStrategyConfig};
use stock_proxy::sessions::{MemorySessionStorage, SessionStorage, StoredSession};
use stock_proxy::signature::{ProxyRequest, SIGNATURE_PARAM, sign_webhook};
use stock_proxy::state::{AppState, http_client};
use stock_proxy::tokens::ManualClock;
use stock_proxy_core::{LocationId, ShopDomain};
use tower::ServiceExt;
use url::Url;

/// Secret used to sign every test request.
pub const API_SECRET: &str = "integration-secret";

/// Shop every test request is about.
pub const SHOP: &str = "demo.myshopify.com";

/// UK warehouse location.
pub const UK_LOCATION: u64 = 1001;

/// US warehouse location.
pub const US_LOCATION: u64 = 2002;

/// Admin GraphQL path for the default API version.
pub const GRAPHQL_PATH: &str = "/admin/api/2023-04/graphql.json";

/// Token exchange path.
pub const TOKEN_PATH: &str = "/admin/oauth/access_token";

/// Parse [`SHOP`].
///
/// # Panics
///
/// Never, the constant is a valid shop domain.
#[must_use]
pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).expect("valid shop domain")
}

/// A static-token configuration pointed at `origin`.
///
/// # Panics
///
/// Panics if `origin` is not a URL.
#[must_use]
pub fn test_config(origin: &str) -> ProxyConfig {
    ProxyConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        shopify: ShopifyConfig {
            store: shop(),
            api_version: "2023-04".to_string(),
            api_secret: Some(SecretString::from(API_SECRET)),
            admin_origin: Some(Url::parse(origin).expect("valid mock origin")),
        },
        locations: LocationConfig {
            uk: Some(LocationId::new(UK_LOCATION)),
            us: Some(LocationId::new(US_LOCATION)),
        },
        tokens: TokenStrategyConfig::Static {
            access_token: SecretString::from("shpat_static"),
        },
        upstream_timeout: Duration::from_secs(5),
        debug_routes: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// An offline session for [`SHOP`].
#[must_use]
pub fn offline_session(token: &str) -> StoredSession {
    StoredSession {
        id: format!("offline_{SHOP}"),
        shop: shop(),
        is_online: false,
        scope: Some("read_inventory".to_string()),
        access_token: SecretString::from(token),
    }
}

/// A router under test with its collaborators.
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<MemorySessionStorage>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Build the app for `config` with in-memory `sessions`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new(config: ProxyConfig, sessions: Vec<StoredSession>) -> Self {
        let sessions = Arc::new(MemorySessionStorage::with_sessions(sessions));
        let clock = Arc::new(ManualClock::new(0));
        let http = http_client(config.upstream_timeout).expect("HTTP client");
        let storage: Arc<dyn SessionStorage> = sessions.clone();
        let state = AppState::new(config, http, storage, clock.clone());

        Self {
            router: stock_proxy::app(state),
            sessions,
            clock,
        }
    }

    /// Send `request` through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails, which it never does for handled paths.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET uri` and decode the JSON body.
    pub async fn get_json(&self, uri: &str) -> (u16, Value, Response<()>) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");
        json_response(self.send(request).await).await
    }
}

/// Split a response into status, JSON body and bodiless head.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_response(response: Response<Body>) -> (u16, Value, Response<()>) {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes).expect("JSON body");
    (parts.status.as_u16(), json, Response::from_parts(parts, ()))
}

/// Sign `params` as Shopify would and return `path?query&signature=...`.
///
/// # Panics
///
/// Never for the non-empty test secret.
#[must_use]
pub fn signed_uri(path: &str, params: &[(&str, &str)]) -> String {
    signed_uri_with_secret(path, params, API_SECRET)
}

/// Like [`signed_uri`] with an explicit secret.
///
/// # Panics
///
/// Panics if `secret` is empty.
#[must_use]
pub fn signed_uri_with_secret(path: &str, params: &[(&str, &str)], secret: &str) -> String {
    let signature = ProxyRequest::from_pairs(params.iter().copied())
        .sign(secret)
        .expect("non-empty secret");

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(SIGNATURE_PARAM, &signature);

    format!("{path}?{}", serializer.finish())
}

/// Admin GraphQL body reporting `available` at the requested location.
#[must_use]
pub fn availability_body(available: &Value) -> Value {
    serde_json::json!({
        "data": {
            "productVariant": {
                "inventoryItem": {
                    "inventoryLevel": { "available": available }
                }
            }
        }
    })
}

/// Base64 webhook HMAC for `body`.
///
/// # Panics
///
/// Never for the non-empty test secret.
#[must_use]
pub fn webhook_hmac(body: &[u8]) -> String {
    sign_webhook(body, API_SECRET).expect("non-empty secret")
}
