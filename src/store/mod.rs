//! Session persistence.
//!
//! [`MemoryStore`] keeps sessions for the life of the process. [`SqliteStore`]
//! writes them to a SQLite file so they survive restarts. Both are last
//! writer wins per session id.

mod schema;
mod sqlite;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

pub use sqlite::SqliteStore;

use crate::models::Session;

pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<Session>>;

    /// Insert or replace the session stored under `session.id`.
    fn save(&self, session: &Session) -> Result<()>;

    /// Ids of all stored sessions, sorted.
    fn list_ids(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<Session>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(sessions.get(id).cloned())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
