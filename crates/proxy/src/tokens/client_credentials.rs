//! OAuth client-credentials exchange with an in-memory cache.
//!
//! Shopify issues short-lived Admin API tokens to apps that post their client
//! ID and secret to `/admin/oauth/access_token` with
//! `grant_type=client_credentials`. The token is cached until less than a
//! minute of its lifetime remains.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use stock_proxy_core::ShopDomain;
use tracing::instrument;
use url::Url;

use super::TokenError;
use super::cache::{DEFAULT_TTL_MS, TokenCache};
use crate::shopify::shop_origin;

/// Grant type for client credentials.
const CLIENT_CREDENTIALS_GRANT_TYPE: &str = "client_credentials";

/// Request body for client credentials exchange.
#[derive(Debug, Serialize)]
struct ClientCredentialsRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

/// Client-credentials token source for one store.
pub struct ClientCredentials {
    client: reqwest::Client,
    shop: ShopDomain,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    cache: TokenCache,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("shop", &self.shop)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    /// Create a token source for `shop`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        shop: ShopDomain,
        origin_override: Option<&Url>,
        client_id: String,
        client_secret: SecretString,
        cache: TokenCache,
    ) -> Self {
        let token_url = format!(
            "{}/admin/oauth/access_token",
            shop_origin(&shop, origin_override)
        );

        Self {
            client,
            shop,
            token_url,
            client_id,
            client_secret,
            cache,
        }
    }

    /// The store this source issues tokens for.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// The backing cache.
    #[must_use]
    pub const fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Return the cached token, exchanging credentials when it is missing or
    /// within a minute of expiry.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Exchange` if Shopify rejects the exchange or
    /// answers without an `access_token`, and `TokenError::Http` on transport
    /// failure.
    pub async fn resolve(&self) -> Result<SecretString, TokenError> {
        if let Some(token) = self.cache.get().await {
            tracing::debug!(shop = %self.shop, "Using cached client-credentials token");
            return Ok(token);
        }

        let (token, ttl_ms) = self.exchange().await?;
        let cached = self.cache.set(token.clone(), ttl_ms).await;
        tracing::info!(
            shop = %self.shop,
            expires_at_ms = cached.expires_at_ms,
            "Obtained client-credentials token"
        );

        Ok(token)
    }

    /// Drop the cached token so the next call exchanges again.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }

    /// Perform one exchange, returning the token and its lifetime in ms.
    #[instrument(skip(self), fields(shop = %self.shop))]
    async fn exchange(&self) -> Result<(SecretString, i64), TokenError> {
        let request_body = ClientCredentialsRequest {
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
            grant_type: CLIENT_CREDENTIALS_GRANT_TYPE,
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let text = response.text().await?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            tracing::error!(status = %status, "Client-credentials exchange rejected");
            return Err(TokenError::Exchange {
                status: status.as_u16(),
                status_text,
                body: parsed.map_or(text, |value| value.to_string()),
            });
        }

        let access_token = parsed
            .as_ref()
            .and_then(|v| v.get("access_token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());

        let Some(access_token) = access_token else {
            tracing::error!("Client-credentials response has no access_token");
            return Err(TokenError::Exchange {
                status: status.as_u16(),
                status_text,
                body: text,
            });
        };

        let ttl_ms = parsed
            .as_ref()
            .and_then(|v| v.get("expires_in"))
            .and_then(ttl_from_expires_in)
            .unwrap_or(DEFAULT_TTL_MS);

        Ok((SecretString::from(access_token.to_string()), ttl_ms))
    }
}

/// Convert a positive `expires_in` (seconds) into milliseconds.
fn ttl_from_expires_in(value: &Value) -> Option<i64> {
    if let Some(secs) = value.as_i64() {
        return (secs > 0).then(|| secs.saturating_mul(1000));
    }

    let secs = value.as_f64().filter(|s| s.is_finite() && *s > 0.0)?;
    #[allow(clippy::cast_possible_truncation)] // Token lifetimes are far below i64::MAX ms
    let ms = (secs * 1000.0) as i64;
    Some(ms)
}
