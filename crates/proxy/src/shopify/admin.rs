//! Shopify Admin API GraphQL client.
//!
//! The client is shop-agnostic: every call names the shop and carries the
//! access token resolved for it.

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use stock_proxy_core::{LocationId, ShopDomain, VariantId};
use tracing::instrument;
use url::Url;

use crate::config::ShopifyConfig;

use super::queries::{VariantAvailability as VariantAvailabilityQuery, variant_availability};
use super::{AdminShopifyError, shop_origin};

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Available stock for one variant at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantAvailability {
    pub variant_id: VariantId,
    pub location_id: LocationId,
    /// Quantity reported by Shopify; 0 when it reported nothing usable.
    pub quantity: i64,
}

impl VariantAvailability {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Shopify Admin API GraphQL client.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_version: String,
    origin_override: Option<Url>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("api_version", &self.inner.api_version)
            .field("origin_override", &self.inner.origin_override)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the upstream timeout)
    /// * `config` - Shopify configuration (API version, origin override)
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client,
                api_version: config.api_version.clone(),
                origin_override: config.admin_origin.clone(),
            }),
        }
    }

    /// GraphQL endpoint for `shop`.
    #[must_use]
    pub fn graphql_endpoint(&self, shop: &ShopDomain) -> String {
        format!(
            "{}/admin/api/{}/graphql.json",
            shop_origin(shop, self.inner.origin_override.as_ref()),
            self.inner.api_version
        )
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query.
    ///
    /// Returns `None` when Shopify answered without `data` or `errors`.
    async fn execute<Q: GraphQLQuery>(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        variables: Q::Variables,
    ) -> Result<Option<Q::ResponseData>, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.graphql_endpoint(shop))
            .header(ACCESS_TOKEN_HEADER, access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Admin API returned non-success status");
            return Err(AdminShopifyError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let graphql_response: Response<Q::ResponseData> = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(AdminShopifyError::Parse {
                    message: e.to_string(),
                    body: text,
                });
            }
        };

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            return Err(AdminShopifyError::GraphQL {
                errors: errors.into_iter().map(|e| e.message).collect(),
                body: text,
            });
        }

        Ok(graphql_response.data)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Get the available quantity of a variant at a location.
    ///
    /// A missing or non-numeric `available` field, or a response without
    /// `data`, is reported as 0.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, an
    /// unparsable body, or a non-empty GraphQL `errors` array.
    #[instrument(skip(self, access_token), fields(shop = %shop, variant_id = %variant_id, location_id = %location_id))]
    pub async fn variant_availability(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> Result<VariantAvailability, AdminShopifyError> {
        let variables = variant_availability::Variables {
            variant_id: variant_id.gid(),
            location_id: location_id.gid(),
        };

        let data = self
            .execute::<VariantAvailabilityQuery>(shop, access_token, variables)
            .await?;

        let quantity = data.as_ref().map_or_else(
            || {
                tracing::debug!("Admin API response carried no data");
                0
            },
            variant_availability::ResponseData::available,
        );

        Ok(VariantAvailability {
            variant_id,
            location_id,
            quantity,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const GRAPHQL_PATH: &str = "/admin/api/2023-04/graphql.json";

    fn client_for(server: &MockServer) -> AdminClient {
        let config = ShopifyConfig {
            store: ShopDomain::parse("demo.myshopify.com").unwrap(),
            api_version: "2023-04".to_string(),
            api_secret: None,
            admin_origin: Some(Url::parse(&server.uri()).unwrap()),
        };
        AdminClient::new(reqwest::Client::new(), &config)
    }

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").unwrap()
    }

    async fn lookup(server: &MockServer) -> Result<VariantAvailability, AdminShopifyError> {
        client_for(server)
            .variant_availability(
                &shop(),
                &SecretString::from("shpat_test"),
                VariantId::new(111),
                LocationId::new(222),
            )
            .await
    }

    #[test]
    fn test_graphql_endpoint_default_origin() {
        let config = ShopifyConfig {
            store: shop(),
            api_version: "2023-04".to_string(),
            api_secret: None,
            admin_origin: None,
        };
        let client = AdminClient::new(reqwest::Client::new(), &config);
        assert_eq!(
            client.graphql_endpoint(&shop()),
            "https://demo.myshopify.com/admin/api/2023-04/graphql.json"
        );
    }

    #[tokio::test]
    async fn test_sends_token_and_global_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(header(ACCESS_TOKEN_HEADER, "shpat_test"))
            .and(body_partial_json(json!({
                "operationName": "VariantAvailability",
                "variables": {
                    "variantId": "gid://shopify/ProductVariant/111",
                    "locationId": "gid://shopify/Location/222"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariant": {"inventoryItem": {"inventoryLevel": {"available": 5}}}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let availability = lookup(&server).await.unwrap();
        assert_eq!(availability.quantity, 5);
        assert!(availability.is_available());
    }

    #[tokio::test]
    async fn test_null_available_is_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariant": {"inventoryItem": {"inventoryLevel": {"available": null}}}}
            })))
            .mount(&server)
            .await;

        let availability = lookup(&server).await.unwrap();
        assert_eq!(availability.quantity, 0);
        assert!(!availability.is_available());
    }

    #[tokio::test]
    async fn test_float_available_is_numeric() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productVariant": {"inventoryItem": {"inventoryLevel": {"available": 5.0}}}}
            })))
            .mount(&server)
            .await;

        let availability = lookup(&server).await.unwrap();
        assert_eq!(availability.quantity, 5);
        assert!(availability.is_available());
    }

    #[tokio::test]
    async fn test_missing_data_is_zero() {
        for body in [json!({"data": null}), json!({})] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(GRAPHQL_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let availability = lookup(&server).await.unwrap();
            assert_eq!(availability.quantity, 0);
            assert!(!availability.is_available());
        }
    }

    #[tokio::test]
    async fn test_graphql_errors_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Access denied for productVariant field."}]
            })))
            .mount(&server)
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert!(matches!(err, AdminShopifyError::GraphQL { .. }));
        assert!(err.to_string().contains("Access denied"));
        assert!(err.details().contains("Access denied"));
    }

    #[tokio::test]
    async fn test_non_success_status_fails_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("[API] Invalid API key"))
            .mount(&server)
            .await;

        let err = lookup(&server).await.unwrap_err();
        match err {
            AdminShopifyError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "[API] Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_keeps_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = lookup(&server).await.unwrap_err();
        assert!(matches!(err, AdminShopifyError::Parse { .. }));
        assert_eq!(err.details(), "<html>oops</html>");
    }
}
