//! App proxy request signing.
//!
//! Produces the query string Shopify would forward, so the proxy can be
//! exercised with curl:
//!
//! ```bash
//! curl "http://127.0.0.1:3000/proxy/inventory?$(sp-cli sign variant=123 country=US)"
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use stock_proxy::signature::{ProxyRequest, SIGNATURE_PARAM};

/// Errors from the sign command.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid parameter '{0}' (expected key=value)")]
    InvalidParam(String),

    #[error("Parameter name '{0}' is reserved")]
    ReservedParam(String),
}

/// Parse `key=value` arguments.
fn parse_params(params: &[String]) -> Result<Vec<(String, String)>, SignError> {
    params
        .iter()
        .map(|raw| {
            let (key, value) = raw
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| SignError::InvalidParam(raw.clone()))?;
            if key == SIGNATURE_PARAM {
                return Err(SignError::ReservedParam(key.to_string()));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Build the signed, percent-encoded query string.
fn signed_query(pairs: &[(String, String)], secret: &str) -> Option<String> {
    let signature = ProxyRequest::from_pairs(pairs.iter().cloned()).sign(secret)?;

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(SIGNATURE_PARAM, &signature);

    Some(serializer.finish())
}

/// Print the signed query string for `params`.
///
/// # Errors
///
/// Returns an error if `SHOPIFY_API_SECRET` is unset or a parameter is not
/// `key=value`.
pub fn run(params: &[String], timestamp: bool) -> Result<(), SignError> {
    let _ = dotenvy::dotenv();

    let secret = std::env::var("SHOPIFY_API_SECRET")
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(SignError::MissingEnvVar("SHOPIFY_API_SECRET"))?;

    let mut pairs = parse_params(params)?;
    if timestamp {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        pairs.push(("timestamp".to_string(), now.to_string()));
    }

    let query = signed_query(&pairs, &secret).ok_or(SignError::MissingEnvVar("SHOPIFY_API_SECRET"))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{query}");
    }

    Ok(())
}
