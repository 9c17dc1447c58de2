//! HTTP route handlers for the proxy.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//!
//! # App Proxy (signed by Shopify)
//! GET  /proxy/inventory           - Variant availability at the UK/US warehouse
//!
//! # Webhooks (HMAC header)
//! POST /webhooks/app/uninstalled  - Delete the shop's sessions
//!
//! # Debug (PROXY_DEBUG_ROUTES=true, signed)
//! GET  /debug/sessions            - Stored sessions for a shop, tokens masked
//! ```
//!
//! Unknown paths answer with a JSON 404 and unsupported methods with a JSON
//! 405.

pub mod debug;
pub mod proxy;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use stock_proxy_core::ShopDomain;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::middleware::{make_request_span, request_id_middleware};
use crate::signature::ProxyRequest;
use crate::state::AppState;

/// Validation message for a missing or non-numeric `variant`.
pub const INVALID_VARIANT: &str = "Missing/invalid variant";

/// Validation message for a missing or malformed shop domain.
pub const INVALID_SHOP: &str = "Missing/invalid shop";

/// Create the app proxy routes router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new().route("/inventory", get(proxy::inventory))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/app/uninstalled", post(webhooks::app_uninstalled))
}

/// Create the debug routes router.
pub fn debug_routes() -> Router<AppState> {
    Router::new().route("/sessions", get(debug::sessions))
}

/// Build the full application router with tracing and request IDs.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/proxy", proxy_routes())
        .nest("/webhooks", webhook_routes());

    if state.config().debug_routes {
        tracing::warn!("Debug routes enabled: /debug/sessions");
        router = router.nest("/debug", debug_routes());
    }

    router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// The app secret that signs proxy requests and webhooks.
pub(crate) fn api_secret(state: &AppState) -> Result<&SecretString> {
    state
        .config()
        .shopify
        .api_secret
        .as_ref()
        .filter(|secret| !secret.expose_secret().is_empty())
        .ok_or_else(|| AppError::Configuration("SHOPIFY_API_SECRET is not set".to_string()))
}

/// Parse `query` and check its app proxy signature.
pub(crate) fn verified_request(state: &AppState, query: Option<&str>) -> Result<ProxyRequest> {
    let secret = api_secret(state)?;
    let request = ProxyRequest::from_query(query.unwrap_or_default());

    if !request.verify(secret.expose_secret()) {
        return Err(AppError::Authentication);
    }

    Ok(request)
}

/// Shop the request is about.
///
/// Per-shop token strategies take the shop from the request and require it.
/// Otherwise the token belongs to the configured store, so a `shop` naming
/// any other store is rejected.
pub(crate) fn request_shop(
    state: &AppState,
    request: &ProxyRequest,
    per_shop: bool,
) -> Result<ShopDomain> {
    let requested = match request.get("shop").filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(ShopDomain::parse(raw).map_err(|_| invalid_shop())?),
        None => None,
    };

    if per_shop {
        return requested.ok_or_else(invalid_shop);
    }

    let store = &state.config().shopify.store;
    match requested {
        Some(shop) if shop != *store => {
            tracing::warn!(
                requested = %shop,
                configured = %store,
                "Request names a store the access token does not belong to"
            );
            Err(invalid_shop())
        }
        _ => Ok(store.clone()),
    }
}

fn invalid_shop() -> AppError {
    AppError::Validation(INVALID_SHOP.to_string())
}
