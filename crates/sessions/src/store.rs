//! Session persistence seam.

use std::collections::HashMap;

use {async_trait::async_trait, tokio::sync::RwLock};

use crate::{Result, session::Session};

/// Atomic per-user session storage.
///
/// Callers serialize access per user, so each operation only has to be atomic
/// on its own.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session, creating a fresh one on first contact.
    async fn get(&self, user_id: &str) -> Result<Session>;

    async fn set(&self, session: &Session) -> Result<()>;

    /// Forget the session entirely.
    async fn clear(&self, user_id: &str) -> Result<()>;
}

/// Process-local store; sessions are lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Session> {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            return Ok(session.clone());
        }
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id))
            .clone())
    }

    async fn set(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }
}
