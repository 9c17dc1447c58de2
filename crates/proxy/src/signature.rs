//! Shopify request signature verification.
//!
//! # App Proxy requests
//!
//! Shopify signs every request it forwards through an App Proxy. The signature
//! is computed over the query string, minus the `signature` parameter:
//!
//! 1. Sort the remaining parameters by key (byte order).
//! 2. Join each pair as `key=value` with **no separator** between pairs.
//! 3. HMAC-SHA256 the result with the app's API secret, lowercase hex.
//!
//! Repeated keys are joined with `,` before signing (`ids=1&ids=2` signs as
//! `ids=1,2`).
//!
//! # Webhooks
//!
//! Webhook bodies are signed with the same secret, but the digest is base64
//! encoded and sent in the `X-Shopify-Hmac-Sha256` header.
//!
//! Every comparison is constant-time and every failure path returns `false`.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the query parameter carrying the proxy signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// HTTP header carrying the webhook HMAC.
pub const WEBHOOK_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Query parameters of an inbound App Proxy request.
///
/// Keys are kept in a `BTreeMap`, whose iteration order is the byte order
/// the signature requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRequest {
    params: BTreeMap<String, String>,
    signature: Option<String>,
}

impl ProxyRequest {
    /// Build from a raw (percent-encoded) query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Build from decoded key/value pairs, in any order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        let mut signature = None;

        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();

            if key == SIGNATURE_PARAM {
                signature = Some(value);
                continue;
            }

            params
                .entry(key)
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        Self { params, signature }
    }

    /// Get a signed parameter by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The supplied signature, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The exact message Shopify signs: `k1=v1k2=v2...`.
    #[must_use]
    pub fn message(&self) -> String {
        self.params.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// Check the supplied signature against `secret`.
    ///
    /// Returns `false` when the signature is missing or malformed, or when
    /// `secret` is empty.
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        let Some(provided) = self.signature() else {
            return false;
        };
        let Some(computed) = self.sign(secret) else {
            return false;
        };

        constant_time_compare(&computed, provided)
    }

    /// Compute the lowercase hex signature for these parameters.
    ///
    /// Returns `None` for an empty secret.
    #[must_use]
    pub fn sign(&self, secret: &str) -> Option<String> {
        hmac_sha256(secret, self.message().as_bytes()).map(hex::encode)
    }
}

/// Verify a set of query parameters (including `signature`) against `secret`.
pub fn verify<I, K, V>(params: I, secret: &str) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ProxyRequest::from_pairs(params).verify(secret)
}

/// Verify a webhook body against its `X-Shopify-Hmac-Sha256` header value.
#[must_use]
pub fn verify_webhook(body: &[u8], provided: &str, secret: &str) -> bool {
    let Some(digest) = hmac_sha256(secret, body) else {
        return false;
    };

    constant_time_compare(&BASE64.encode(digest), provided.trim())
}

/// Compute the base64 webhook signature of `body`.
///
/// Returns `None` for an empty secret.
#[must_use]
pub fn sign_webhook(body: &[u8], secret: &str) -> Option<String> {
    hmac_sha256(secret, body).map(|digest| BASE64.encode(digest))
}

fn hmac_sha256(secret: &str, message: &[u8]) -> Option<Vec<u8>> {
    if secret.is_empty() {
        return None;
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reference_hmac(secret: &str, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("valid key length");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_message_sorted_without_separators() {
        let request = ProxyRequest::from_pairs([("foo", "1"), ("bar", "2"), ("signature", "x")]);
        assert_eq!(request.message(), "bar=2foo=1");
    }

    #[test]
    fn test_sign_matches_reference_hmac() {
        let request = ProxyRequest::from_pairs([("foo", "1"), ("bar", "2")]);
        assert_eq!(
            request.sign("shhh").unwrap(),
            reference_hmac("shhh", "bar=2foo=1")
        );
    }

    #[test]
    fn test_verify_valid_signature() {
        let signature = reference_hmac("shhh", "bar=2foo=1");
        assert!(verify(
            [("foo", "1"), ("bar", "2"), ("signature", signature.as_str())],
            "shhh"
        ));
    }

    #[test]
    fn test_verify_is_order_independent() {
        let params = [
            ("shop", "example.myshopify.com"),
            ("path_prefix", "/apps/stock"),
            ("timestamp", "1700000000"),
            ("variant", "123"),
            ("country", "US"),
        ];
        let signature = ProxyRequest::from_pairs(params).sign("s3cr3t").unwrap();

        let mut forward: Vec<(&str, &str)> = params.to_vec();
        forward.push(("signature", signature.as_str()));
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(3);

        assert!(verify(forward, "s3cr3t"));
        assert!(verify(reversed, "s3cr3t"));
        assert!(verify(rotated, "s3cr3t"));
    }

    #[test]
    fn test_sort_is_bytewise() {
        // Uppercase sorts before lowercase in byte order
        let request = ProxyRequest::from_pairs([("b", "1"), ("B", "2"), ("a", "3")]);
        assert_eq!(request.message(), "B=2a=3b=1");
    }

    #[test]
    fn test_repeated_keys_are_comma_joined() {
        let request = ProxyRequest::from_query("ids=1&ids=2&x=y");
        assert_eq!(request.get("ids"), Some("1,2"));
        assert_eq!(request.message(), "ids=1,2x=y");
    }

    #[test]
    fn test_from_query_decodes() {
        let request = ProxyRequest::from_query("path_prefix=%2Fapps%2Fstock&signature=abc");
        assert_eq!(request.get("path_prefix"), Some("/apps/stock"));
        assert_eq!(request.signature(), Some("abc"));
        assert_eq!(request.get("signature"), None);
    }

    #[test]
    fn test_verify_missing_signature() {
        assert!(!verify([("foo", "1")], "shhh"));
    }

    #[test]
    fn test_verify_empty_secret_fails_closed() {
        // Even a signature computed with an empty key must be rejected
        let forged = reference_hmac("", "foo=1");
        assert!(!verify([("foo", "1"), ("signature", forged.as_str())], ""));
        assert!(ProxyRequest::from_pairs([("foo", "1")]).sign("").is_none());
    }

    #[test]
    fn test_verify_non_hex_signature() {
        let bogus = "z".repeat(64);
        assert!(!verify([("foo", "1"), ("signature", bogus.as_str())], "shhh"));
        assert!(!verify([("foo", "1"), ("signature", "not hex at all")], "shhh"));
    }

    #[test]
    fn test_verify_wrong_length_signature() {
        let signature = reference_hmac("shhh", "foo=1");
        let short = signature.get(..32).unwrap();
        let long = format!("{signature}00");
        assert!(!verify([("foo", "1"), ("signature", short)], "shhh"));
        assert!(!verify([("foo", "1"), ("signature", long.as_str())], "shhh"));
        assert!(!verify([("foo", "1"), ("signature", "")], "shhh"));
    }

    #[test]
    fn test_verify_uppercase_hex_rejected() {
        let signature = reference_hmac("shhh", "foo=1").to_uppercase();
        assert!(!verify([("foo", "1"), ("signature", signature.as_str())], "shhh"));
    }

    #[test]
    fn test_verify_tampered_value() {
        let signature = reference_hmac("shhh", "variant=1");
        assert!(!verify(
            [("variant", "2"), ("signature", signature.as_str())],
            "shhh"
        ));
    }

    #[test]
    fn test_webhook_round_trip() {
        let body = br#"{"id":1,"domain":"example.myshopify.com"}"#;
        let header = sign_webhook(body, "whsec").unwrap();
        assert!(verify_webhook(body, &header, "whsec"));
        assert!(!verify_webhook(b"tampered", &header, "whsec"));
        assert!(!verify_webhook(body, &header, "other"));
        assert!(!verify_webhook(body, &header, ""));
        assert!(!verify_webhook(body, "", "whsec"));
    }
}
