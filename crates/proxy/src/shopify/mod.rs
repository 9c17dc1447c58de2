//! Shopify Admin API client.
//!
//! # Security
//!
//! Admin API tokens are never stored on the client. Callers resolve a token
//! per request (see [`crate::tokens`]) and pass it in.
//!
//! # Architecture
//!
//! - `graphql_client` generates typed queries from `graphql/admin/`
//! - `reqwest` performs the HTTP calls, with the timeout configured on the
//!   shared client
//! - Direct API calls to Shopify (no local cache of inventory)

mod admin;
pub mod queries;

pub use admin::{AdminClient, VariantAvailability};

use stock_proxy_core::ShopDomain;
use thiserror::Error;
use url::Url;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("Admin API returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {message}")]
    Parse {
        /// Parser message.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.errors))]
    GraphQL {
        /// Error messages in response order.
        errors: Vec<String>,
        /// Raw response body.
        body: String,
    },
}

impl AdminShopifyError {
    /// Diagnostic details safe to echo on a server-to-server path.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            Self::Http(e) => e.to_string(),
            Self::Status { status, body } => format!("{status}: {body}"),
            Self::Parse { body, .. } | Self::GraphQL { body, .. } => body.clone(),
        }
    }
}

fn format_graphql_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }
    errors.join("; ")
}

/// Base URL for all calls concerning `shop`.
///
/// Defaults to `https://{shop}`; `override_origin` replaces it (local mocks).
#[must_use]
pub fn shop_origin(shop: &ShopDomain, override_origin: Option<&Url>) -> String {
    override_origin.map_or_else(
        || format!("https://{shop}"),
        |origin| origin.as_str().trim_end_matches('/').to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let err = AdminShopifyError::GraphQL {
            errors: vec!["Field not found".to_string(), "Invalid ID".to_string()],
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_status_error_details() {
        let err = AdminShopifyError::Status {
            status: 503,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "Admin API returned 503");
        assert_eq!(err.details(), "503: upstream down");
    }

    #[test]
    fn test_shop_origin() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        assert_eq!(shop_origin(&shop, None), "https://demo.myshopify.com");

        let local = Url::parse("http://127.0.0.1:9000/").unwrap();
        assert_eq!(shop_origin(&shop, Some(&local)), "http://127.0.0.1:9000");
    }
}
