//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors are rendered as JSON
//! `{"error": "...", "details": "..."}` with an explicit status, and server
//! side failures are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::shopify::AdminShopifyError;
use crate::tokens::TokenError;

/// Application-level error type for the proxy.
#[derive(Debug, Error)]
pub enum AppError {
    /// A setting needed to serve the request is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or invalid request signature.
    #[error("Invalid signature")]
    Authentication,

    /// Malformed request input.
    #[error("{0}")]
    Validation(String),

    /// No access token could be produced for the shop.
    #[error("Token error: {0}")]
    TokenResolution(#[from] TokenError),

    /// Shopify Admin API call failed.
    #[error("Shopify error: {0}")]
    Upstream(#[from] AdminShopifyError),

    /// Unknown route.
    #[error("Not found")]
    NotFound,

    /// Known route, unsupported HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TokenResolution(TokenError::NoOfflineSession { .. }) => StatusCode::UNAUTHORIZED,
            Self::TokenResolution(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Client-facing body.
    ///
    /// Upstream failures carry the Admin API response as `details`.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Self::Configuration(missing) => {
                ("Server misconfigured".to_string(), Some(missing.clone()))
            }
            Self::Authentication => ("Invalid signature".to_string(), None),
            Self::Validation(message) => (message.clone(), None),
            Self::TokenResolution(TokenError::NoOfflineSession { shop }) => (
                "No access token for shop".to_string(),
                Some(format!(
                    "No offline session is stored for {shop}. Reinstall the app on this store to grant a new offline token."
                )),
            ),
            Self::TokenResolution(TokenError::Exchange {
                status,
                status_text,
                body,
            }) => (
                "Token exchange failed".to_string(),
                Some(format!("{status} {status_text}: {body}")),
            ),
            Self::TokenResolution(TokenError::Http(e)) => {
                ("Token exchange failed".to_string(), Some(e.to_string()))
            }
            Self::Upstream(e) => ("Shopify Admin API error".to_string(), Some(e.details())),
            Self::NotFound => ("Not found".to_string(), None),
            Self::MethodNotAllowed => ("Method not allowed".to_string(), None),
            Self::Internal(_) => ("Internal server error".to_string(), None),
        };

        ErrorBody { error, details }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
