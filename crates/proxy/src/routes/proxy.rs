//! App Proxy inventory endpoint.
//!
//! Shopify forwards `/apps/<prefix>/inventory?variant=...` from the storefront
//! to this handler with a signed query string.

use axum::{
    Json,
    extract::{RawQuery, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use stock_proxy_core::{Country, LocationId, VariantId};
use tracing::instrument;

use super::{INVALID_VARIANT, request_shop, verified_request};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cache directive on successful lookups.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=15";

/// Successful availability response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub variant_id: VariantId,
    pub country: Country,
    pub location_id: LocationId,
    pub qty: i64,
    pub available: bool,
}

/// Report availability of `variant` at the warehouse serving `country`.
///
/// Query: `variant` (digits, required), `country` (`UK`/`GB`/`US`, default
/// UK), `shop`, `signature`.
#[instrument(skip(state, query), fields(shop, variant_id, country))]
pub async fn inventory(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse> {
    let request = verified_request(&state, query.as_deref())?;

    let variant_id = request
        .get("variant")
        .and_then(|raw| VariantId::parse(raw).ok())
        .ok_or_else(|| AppError::Validation(INVALID_VARIANT.to_string()))?;

    let shop = request_shop(&state, &request, state.tokens().requires_shop())?;
    let country = Country::from_param(request.get("country"));

    let span = tracing::Span::current();
    span.record("shop", shop.as_str());
    span.record("variant_id", variant_id.as_u64());
    span.record("country", country.code());

    let location_id = state
        .locations()
        .location_for(country)
        .ok_or_else(|| AppError::Configuration(format!("{} is not set", location_env(country))))?;

    let token = state.tokens().resolve(&shop).await?;
    let availability = state
        .admin()
        .variant_availability(&shop, &token, variant_id, location_id)
        .await?;

    tracing::info!(
        location_id = %location_id,
        qty = availability.quantity,
        "Inventory lookup complete"
    );

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Json(InventoryResponse {
            variant_id,
            country,
            location_id,
            qty: availability.quantity,
            available: availability.is_available(),
        }),
    ))
}

const fn location_env(country: Country) -> &'static str {
    match country {
        Country::Uk => "UK_LOCATION_ID",
        Country::Us => "US_LOCATION_ID",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_value(InventoryResponse {
            variant_id: VariantId::new(42),
            country: Country::Us,
            location_id: LocationId::new(7),
            qty: 3,
            available: true,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "variantId": 42,
                "country": "US",
                "locationId": 7,
                "qty": 3,
                "available": true
            })
        );
    }

    #[test]
    fn test_location_env() {
        assert_eq!(location_env(Country::Uk), "UK_LOCATION_ID");
        assert_eq!(location_env(Country::Us), "US_LOCATION_ID");
    }
}
