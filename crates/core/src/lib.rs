//! Stock Proxy Core - Shared types library.
//!
//! This crate provides the types used across the stock proxy components:
//! - `proxy` - App Proxy inventory endpoint and webhooks
//! - `cli` - Command-line tools for migrations and request signing
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shopify numeric IDs, shop domains, and warehouse countries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
