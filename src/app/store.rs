use std::collections::HashMap;

use tokio::sync::RwLock;

use super::traits::SessionStore;
use crate::session::Session;
use crate::types::SessionId;

type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Process-local session store.
///
/// Sessions live until they are removed or the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// The only stored session. Panics unless exactly one exists.
    #[cfg(test)]
    pub(crate) async fn single(&self) -> Session {
        let sessions = self.sessions.read().await;
        assert_eq!(sessions.len(), 1, "expected exactly one session");
        sessions.values().next().cloned().unwrap()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, id: &SessionId, session: Session) -> Result<(), StoreError> {
        self.sessions.write().await.insert(*id, session);
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
