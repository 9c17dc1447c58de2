//! Core types for the stock proxy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod id;
pub mod shop;

pub use country::Country;
pub use id::*;
pub use shop::{ShopDomain, ShopDomainError};
