use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::{schema, SessionStore};
use crate::models::{KnowledgeLevel, Session};

/// Sessions in a SQLite file, one row per session with JSON columns.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// `careerpath.db` in the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "careerpath")
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("careerpath.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))
    }
}

struct SessionRow {
    id: String,
    history: String,
    roadmap: String,
    interests: String,
    knowledge_level: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        Ok(Session {
            history: serde_json::from_str(&self.history)
                .with_context(|| format!("Corrupt history for session {}", self.id))?,
            roadmap: serde_json::from_str(&self.roadmap)
                .with_context(|| format!("Corrupt roadmap for session {}", self.id))?,
            interests: serde_json::from_str(&self.interests).unwrap_or_default(),
            knowledge_level: self
                .knowledge_level
                .as_deref()
                .and_then(|l| l.parse::<KnowledgeLevel>().ok()),
            created_at: parse_datetime(&self.created_at),
            updated_at: parse_datetime(&self.updated_at),
            id: self.id,
        })
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SessionStore for SqliteStore {
    fn load(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, history, roadmap, interests, knowledge_level, created_at, updated_at
                 FROM sessions WHERE id = ?",
                [id],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        history: row.get(1)?,
                        roadmap: row.get(2)?,
                        interests: row.get(3)?,
                        knowledge_level: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        row.map(SessionRow::into_session).transpose()
    }

    fn save(&self, session: &Session) -> Result<()> {
        let history = serde_json::to_string(&session.history)?;
        let roadmap = serde_json::to_string(&session.roadmap)?;
        let interests = serde_json::to_string(&session.interests)?;
        let level = session.knowledge_level.map(|l| l.as_str());

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (id, history, roadmap, interests, knowledge_level, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                history = excluded.history,
                roadmap = excluded.roadmap,
                interests = excluded.interests,
                knowledge_level = excluded.knowledge_level,
                updated_at = excluded.updated_at",
            rusqlite::params![
                session.id,
                history,
                roadmap,
                interests,
                level,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM sessions ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
