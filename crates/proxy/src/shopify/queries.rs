//! GraphQL query definitions for the Shopify Admin API.
//!
//! Uses `graphql_client` to generate type-safe Rust code from GraphQL queries.

use graphql_client::GraphQLQuery;

// =============================================================================
// Custom scalar type aliases (used by graphql_client)
// =============================================================================

/// Raw `available` value, coerced by [`variant_availability::ResponseData::available`].
type InventoryQuantity = serde_json::Value;

// =============================================================================
// Inventory queries
// =============================================================================

/// Available quantity of one variant at one location.
#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/inventory.graphql",
    response_derives = "Debug, Clone"
)]
pub struct VariantAvailability;

impl variant_availability::ResponseData {
    /// The `available` quantity, or 0 when missing or not numeric.
    ///
    /// Fractional values are truncated toward zero.
    #[must_use]
    pub fn available(&self) -> i64 {
        self.product_variant
            .as_ref()
            .and_then(|v| v.inventory_item.inventory_level.as_ref())
            .and_then(|l| l.available.as_ref())
            .and_then(quantity)
            .unwrap_or(0)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn quantity(value: &InventoryQuantity) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::variant_availability::{ResponseData, Variables};
    use super::*;

    fn parse(json: &str) -> ResponseData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_build_query() {
        let body = VariantAvailability::build_query(Variables {
            variant_id: "gid://shopify/ProductVariant/1".to_string(),
            location_id: "gid://shopify/Location/2".to_string(),
        });
        assert_eq!(body.operation_name, "VariantAvailability");
        assert!(body.query.contains("inventoryLevel(locationId: $locationId)"));

        let json = serde_json::to_value(&body.variables).unwrap();
        assert_eq!(json["variantId"], "gid://shopify/ProductVariant/1");
        assert_eq!(json["locationId"], "gid://shopify/Location/2");
    }

    #[test]
    fn test_available_number() {
        let data = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":7}}}}"#,
        );
        assert_eq!(data.available(), 7);
    }

    #[test]
    fn test_available_float_is_numeric() {
        let whole = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":5.0}}}}"#,
        );
        assert_eq!(whole.available(), 5);

        let fractional = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":2.9}}}}"#,
        );
        assert_eq!(fractional.available(), 2);
    }

    #[test]
    fn test_available_null_or_missing_is_zero() {
        let null = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":null}}}}"#,
        );
        assert_eq!(null.available(), 0);

        let no_level = parse(r#"{"productVariant":{"inventoryItem":{"inventoryLevel":null}}}"#);
        assert_eq!(no_level.available(), 0);

        let no_variant = parse(r#"{"productVariant":null}"#);
        assert_eq!(no_variant.available(), 0);

        let missing_field = parse(r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{}}}}"#);
        assert_eq!(missing_field.available(), 0);
    }

    #[test]
    fn test_available_non_numeric_is_zero() {
        let data = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":"12"}}}}"#,
        );
        assert_eq!(data.available(), 0);
    }

    #[test]
    fn test_negative_available_is_kept() {
        let data = parse(
            r#"{"productVariant":{"inventoryItem":{"inventoryLevel":{"available":-3}}}}"#,
        );
        assert_eq!(data.available(), -3);
    }
}
