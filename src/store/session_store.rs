//! In-memory session store with per-session atomic updates.
//!
//! Sessions live only for the process lifetime; there is no persistence
//! layer by design. Concurrent readers are permitted while a single
//! writer applies a mutation under the store's write lock, so callers
//! never observe a partially applied update.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::session::{EventContext, Session};
use crate::{AppError, Result};

/// Process-wide store of planning sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for the given context and return it.
    pub async fn create(&self, context: EventContext) -> Session {
        let session = Session::new(context);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        debug!(session_id = %session.id, "session created");
        session
    }

    /// Fetch a snapshot of a session by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids.
    pub async fn get(&self, session_id: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))
    }

    /// Apply a mutation to a session under the write lock.
    ///
    /// The closure runs exactly once against the live record; the
    /// `updated_at` timestamp is refreshed afterwards. Returns the
    /// post-mutation snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))?;
        mutate(session);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    /// Remove a session (explicit reset).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids.
    pub async fn remove(&self, session_id: &str) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(session_id)
            .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
