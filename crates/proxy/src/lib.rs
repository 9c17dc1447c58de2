//! Stock Proxy library.
//!
//! A Shopify App Proxy service that tells the storefront how many units of a
//! product variant are available at the UK or US warehouse.
//!
//! # Request flow
//!
//! 1. [`signature`] verifies the HMAC Shopify adds to every proxied request
//! 2. [`tokens`] resolves an Admin API access token (static, client
//!    credentials, or offline session)
//! 3. [`shopify`] queries the inventory level at the warehouse's location
//! 4. [`routes`] shapes the result into a small cacheable JSON payload

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod locations;
pub mod middleware;
pub mod routes;
pub mod sessions;
pub mod shopify;
pub mod signature;
pub mod state;
pub mod tokens;

pub use config::ProxyConfig;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
