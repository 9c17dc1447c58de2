//! In-process session storage.
//!
//! Used by tests and by deployments that seed sessions at startup instead of
//! running a database.

use async_trait::async_trait;
use stock_proxy_core::ShopDomain;
use tokio::sync::RwLock;

use super::{RepositoryError, SessionStorage, StoredSession};

/// Session storage held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    sessions: RwLock<Vec<StoredSession>>,
}

impl MemorySessionStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with `sessions`.
    #[must_use]
    pub fn with_sessions(sessions: Vec<StoredSession>) -> Self {
        Self {
            sessions: RwLock::new(sessions),
        }
    }

    /// Append a session, replacing any existing session with the same ID.
    pub async fn insert(&self, session: StoredSession) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|s| s.id != session.id);
        sessions.push(session);
    }

    /// Number of stored sessions across all shops.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn find_by_shop(&self, shop: &ShopDomain) -> Result<Vec<StoredSession>, RepositoryError> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| &s.shop == shop)
            .cloned()
            .collect())
    }

    async fn delete_by_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| &s.shop != shop);
        Ok((before - sessions.len()) as u64)
    }
}
