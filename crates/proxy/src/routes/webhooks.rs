//! Shopify webhook handlers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use stock_proxy_core::ShopDomain;
use tracing::instrument;

use super::{INVALID_SHOP, api_secret};
use crate::error::{AppError, Result};
use crate::signature::{WEBHOOK_HMAC_HEADER, verify_webhook};
use crate::state::AppState;

/// Header naming the shop a webhook is about.
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// Response to a handled uninstall.
#[derive(Debug, Serialize)]
pub struct UninstallResponse {
    pub ok: bool,
    pub deleted: u64,
}

/// Handle `app/uninstalled`: drop every session and cached token for the
/// shop.
#[instrument(skip_all, fields(shop))]
pub async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UninstallResponse>> {
    let secret = api_secret(&state)?;

    let provided = headers
        .get(WEBHOOK_HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Authentication)?;

    if !verify_webhook(&body, provided, secret.expose_secret()) {
        return Err(AppError::Authentication);
    }

    let shop = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| ShopDomain::parse(raw).ok())
        .ok_or_else(|| AppError::Validation(INVALID_SHOP.to_string()))?;
    tracing::Span::current().record("shop", shop.as_str());

    let deleted = state
        .sessions()
        .delete_by_shop(&shop)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to delete sessions: {e}")))?;
    state.tokens().invalidate(&shop).await;

    tracing::info!(deleted, "App uninstalled, sessions removed");

    Ok(Json(UninstallResponse { ok: true, deleted }))
}
