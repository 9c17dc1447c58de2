//! Offline-session token lookup.

use std::sync::Arc;

use secrecy::SecretString;
use stock_proxy_core::ShopDomain;
use tracing::instrument;

use super::TokenError;
use crate::sessions::{SessionStorage, StoredSession};

/// Reads offline Admin API tokens persisted by the app's install flow.
#[derive(Clone)]
pub struct OfflineSessions {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for OfflineSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineSessions").finish_non_exhaustive()
    }
}

impl OfflineSessions {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Find the first offline session for `shop` with a non-empty token.
    ///
    /// Storage failures are logged and reported as "no session".
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn find_offline_token(&self, shop: &ShopDomain) -> Option<SecretString> {
        let sessions = match self.storage.find_by_shop(shop).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load sessions");
                return None;
            }
        };

        sessions
            .into_iter()
            .find(StoredSession::is_usable_offline)
            .map(|session| session.access_token)
    }

    /// Resolve the offline token for `shop`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::NoOfflineSession` when no usable session exists.
    pub async fn resolve(&self, shop: &ShopDomain) -> Result<SecretString, TokenError> {
        self.find_offline_token(shop)
            .await
            .ok_or_else(|| TokenError::NoOfflineSession { shop: shop.clone() })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::sessions::{MemorySessionStorage, RepositoryError};

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").unwrap()
    }

    fn session(id: &str, is_online: bool, token: &str) -> StoredSession {
        StoredSession {
            id: id.to_string(),
            shop: shop(),
            is_online,
            scope: Some("read_inventory".to_string()),
            access_token: SecretString::from(token),
        }
    }

    #[derive(Debug)]
    struct FailingStorage;

    #[async_trait]
    impl SessionStorage for FailingStorage {
        async fn find_by_shop(
            &self,
            _shop: &ShopDomain,
        ) -> Result<Vec<StoredSession>, RepositoryError> {
            Err(RepositoryError::DataCorruption("boom".to_string()))
        }

        async fn delete_by_shop(&self, _shop: &ShopDomain) -> Result<u64, RepositoryError> {
            Err(RepositoryError::DataCorruption("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_skips_online_and_empty_sessions() {
        let storage = MemorySessionStorage::with_sessions(vec![
            session("online_1", true, "shpua_online"),
            session("offline_empty", false, ""),
            session("offline_demo.myshopify.com", false, "shpat_offline"),
        ]);
        let lookup = OfflineSessions::new(Arc::new(storage));

        let token = lookup.find_offline_token(&shop()).await.unwrap();
        assert_eq!(token.expose_secret(), "shpat_offline");
    }

    #[tokio::test]
    async fn test_no_session_is_error() {
        let lookup = OfflineSessions::new(Arc::new(MemorySessionStorage::new()));
        let err = lookup.resolve(&shop()).await.unwrap_err();
        assert!(matches!(err, TokenError::NoOfflineSession { ref shop } if shop.as_str() == "demo.myshopify.com"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_treated_as_absent() {
        let lookup = OfflineSessions::new(Arc::new(FailingStorage));
        assert!(lookup.find_offline_token(&shop()).await.is_none());
        assert!(matches!(
            lookup.resolve(&shop()).await,
            Err(TokenError::NoOfflineSession { .. })
        ));
    }
}
