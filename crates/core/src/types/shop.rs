//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that is not allowed in a hostname.
    #[error("shop domain contains an invalid character")]
    InvalidCharacter,
    /// The input is not a `*.myshopify.com` domain.
    #[error("shop domain must end with .myshopify.com")]
    NotMyshopify,
}

/// A Shopify shop domain such as `example.myshopify.com`.
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Lowercased on parse
/// - Only ASCII letters, digits, `-` and `.`
/// - Must be `<name>.myshopify.com` with a non-empty name
///
/// ## Examples
///
/// ```
/// use stock_proxy_core::ShopDomain;
///
/// assert!(ShopDomain::parse("example.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("Example.MyShopify.com").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("example.com").is_err());
/// assert!(ShopDomain::parse("evil.com/.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a hostname.
    pub const MAX_LENGTH: usize = 255;

    const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains characters
    /// outside `[a-z0-9.-]`, or is not a `*.myshopify.com` domain.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let lower = s.to_ascii_lowercase();
        if !lower
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
        {
            return Err(ShopDomainError::InvalidCharacter);
        }

        match lower.strip_suffix(Self::SUFFIX) {
            Some(name) if !name.is_empty() && !name.starts_with('.') => Ok(Self(lower)),
            _ => Err(ShopDomainError::NotMyshopify),
        }
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        assert!(ShopDomain::parse("a.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-store-2.myshopify.com").is_ok());
    }

    #[test]
    fn test_lowercases_and_trims() {
        let shop = ShopDomain::parse("  My-Store.MYSHOPIFY.com ").unwrap();
        assert_eq!(shop.as_str(), "my-store.myshopify.com");
    }

    #[test]
    fn test_rejects_other_hosts() {
        assert_eq!(
            ShopDomain::parse("example.com"),
            Err(ShopDomainError::NotMyshopify)
        );
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::NotMyshopify)
        );
        assert_eq!(
            ShopDomain::parse("myshopify.com"),
            Err(ShopDomainError::NotMyshopify)
        );
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter)
        );
        assert_eq!(
            ShopDomain::parse("a b.myshopify.com"),
            Err(ShopDomainError::InvalidCharacter)
        );
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(250));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let shop: ShopDomain = serde_json::from_str("\"x.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "x.myshopify.com");
        assert!(serde_json::from_str::<ShopDomain>("\"x.example.com\"").is_err());
    }
}
