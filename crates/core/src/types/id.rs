//! Numeric Shopify IDs and their global-ID (`gid://`) form.
//!
//! Use the `define_shopify_id!` macro to create type-safe ID wrappers that
//! prevent accidentally passing a location where a variant is expected.

/// Errors that can occur when parsing a numeric Shopify ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input contains something other than ASCII digits.
    #[error("id must contain only digits")]
    NotNumeric,
    /// The input does not fit in 64 bits.
    #[error("id is out of range")]
    OutOfRange,
}

/// Parse a digit-only string into a `u64`.
///
/// Signs, whitespace and separators are rejected, unlike `str::parse`.
///
/// # Errors
///
/// Returns an error if the input is empty, contains a non-digit, or overflows.
pub fn parse_numeric_id(s: &str) -> Result<u64, IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdError::NotNumeric);
    }
    s.parse::<u64>().map_err(|_| IdError::OutOfRange)
}

/// Macro to define a type-safe Shopify ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_u64()`, `parse()`, `gid()`
/// - `FromStr`, `Display`, `From<u64>` and `Into<u64>` implementations
///
/// # Example
///
/// ```rust
/// # use stock_proxy_core::define_shopify_id;
/// define_shopify_id!(OrderId, "Order");
///
/// let id = OrderId::parse("42").unwrap();
/// assert_eq!(id.gid(), "gid://shopify/Order/42");
/// ```
#[macro_export]
macro_rules! define_shopify_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Shopify resource name used in the global ID.
            pub const RESOURCE: &'static str = $resource;

            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Parse an ID from a digit-only string.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a non-empty run of ASCII digits
            /// that fits in a `u64`.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::parse_numeric_id(s).map(Self)
            }

            /// Render the Shopify global ID, e.g. `gid://shopify/Location/123`.
            #[must_use]
            pub fn gid(&self) -> String {
                format!("gid://shopify/{}/{}", Self::RESOURCE, self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_shopify_id!(VariantId, "ProductVariant");
define_shopify_id!(LocationId, "Location");
