//! `PostgreSQL` session storage.

use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::PgPool;
use stock_proxy_core::ShopDomain;
use tracing::instrument;

use super::{RepositoryError, SessionStorage, StoredSession};

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    is_online: bool,
    scope: Option<String>,
    access_token: String,
}

impl TryFrom<SessionRow> for StoredSession {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("session {} has bad shop: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            shop,
            is_online: row.is_online,
            scope: row.scope,
            access_token: SecretString::from(row.access_token),
        })
    }
}

/// Session storage backed by the `shopify_sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionStorage {
    pool: PgPool,
}

impl PgSessionStorage {
    /// Create a new session storage over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStorage for PgSessionStorage {
    #[instrument(skip(self), fields(shop = %shop))]
    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<StoredSession>, RepositoryError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT id, shop, is_online, scope, access_token
            FROM shopify_sessions
            WHERE shop = $1
            ORDER BY is_online ASC, updated_at DESC
            ",
        )
        .bind(shop.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredSession::try_from).collect()
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shopify_sessions
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
