//! Warehouse country selected by the storefront.

use serde::{Deserialize, Serialize};

/// Country whose warehouse stock is reported.
///
/// Only two warehouses exist. Anything that is not recognisably the US,
/// including a missing value, falls back to the UK warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Country {
    /// United Kingdom (accepts `UK` and `GB`).
    #[default]
    #[serde(rename = "UK")]
    Uk,
    /// United States.
    #[serde(rename = "US")]
    Us,
}

impl Country {
    /// Resolve a storefront `country` parameter, case-insensitively.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(code) if code.eq_ignore_ascii_case("US") => Self::Us,
            _ => Self::Uk,
        }
    }

    /// Two-letter code used in responses.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Uk => "UK",
            Self::Us => "US",
        }
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
