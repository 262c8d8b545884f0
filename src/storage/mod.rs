//! Conversation store
//!
//! Append-only turn log keyed by conversation id and user id. Reads return
//! the newest turns, re-ordered oldest first, so the dialogue engine can
//! rebuild its state from history on every request.

use crate::error::{Result, VyparError};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

pub mod types;
pub use types::{ConversationSummary, Role, Turn, TurnMetadata};

/// Selects the turns of one conversation, one user, or both jointly
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFilter<'a> {
    /// Conversation identifier
    pub conversation_id: Option<&'a str>,
    /// User identifier
    pub user_id: Option<&'a str>,
}

impl<'a> HistoryFilter<'a> {
    /// Filter on a single conversation
    pub fn conversation(conversation_id: &'a str) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            user_id: None,
        }
    }

    /// Filter on every conversation of a user
    pub fn user(user_id: &'a str) -> Self {
        Self {
            conversation_id: None,
            user_id: Some(user_id),
        }
    }

    fn where_clause(&self) -> Result<(String, Vec<&'a str>)> {
        match (self.conversation_id, self.user_id) {
            (Some(c), Some(u)) => Ok((
                "conversation_id = ?1 AND user_id = ?2".to_string(),
                vec![c, u],
            )),
            (Some(c), None) => Ok(("conversation_id = ?1".to_string(), vec![c])),
            (None, Some(u)) => Ok(("user_id = ?1".to_string(), vec![u])),
            (None, None) => Err(VyparError::Storage(
                "History query needs a conversation id or a user id".to_string(),
            )
            .into()),
        }
    }
}

/// Append-only conversation log
///
/// Implementations must keep reads chronologically stable: turns written in
/// the same instant come back in insertion order.
pub trait ConversationStore: Send + Sync {
    /// Append a turn
    fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        metadata: Option<&TurnMetadata>,
        user_id: Option<&str>,
    ) -> Result<()>;

    /// Newest `limit` turns matching the filter, returned oldest first
    fn recent_history(&self, filter: HistoryFilter<'_>, limit: usize) -> Result<Vec<Turn>>;

    /// Every turn matching the filter, newest first
    fn full_history(&self, filter: HistoryFilter<'_>) -> Result<Vec<Turn>>;

    /// Conversation the user wrote to most recently
    fn latest_conversation_for_user(&self, user_id: &str) -> Result<Option<String>>;

    /// Most recently active conversations
    fn list_conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>>;
}

/// SQLite-backed conversation store
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the store in the platform data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "vypar", "vypar")
            .ok_or_else(|| VyparError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("conversations.db"))
    }

    /// Open the store at a configured path, falling back to the data directory
    pub fn from_config(config: &crate::config::StorageConfig) -> Result<Self> {
        match &config.db_path {
            Some(path) => Self::new_with_path(path.clone()),
            None => Self::new(),
        }
    }

    /// Create a store that uses the specified database path
    ///
    /// # Examples
    ///
    /// ```
    /// use vypar::storage::SqliteStorage;
    ///
    /// let dir = std::env::temp_dir().join("vypar-doc");
    /// let storage = SqliteStorage::new_with_path(dir.join("conversations.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| VyparError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::info!("Conversation store ready at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| VyparError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS turns (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                user_id TEXT,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_turns_conversation ON turns (conversation_id);
            CREATE INDEX IF NOT EXISTS idx_turns_user ON turns (user_id);",
        )
        .context("Failed to create tables")
        .map_err(|e| VyparError::Storage(e.to_string()))?;

        Ok(())
    }

    fn query_turns(&self, filter: HistoryFilter<'_>, limit: Option<usize>) -> Result<Vec<Turn>> {
        let (clause, args) = filter.where_clause()?;
        let mut sql = format!(
            "SELECT seq, conversation_id, user_id, role, content, metadata, created_at
             FROM turns WHERE {} ORDER BY created_at DESC, seq DESC",
            clause
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&sql)
            .context("Failed to prepare statement")
            .map_err(|e| VyparError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(args), row_to_turn)
            .context("Failed to query turns")
            .map_err(|e| VyparError::Storage(e.to_string()))?;

        let mut turns = Vec::new();
        for row in rows {
            match row {
                Ok(turn) => turns.push(turn),
                Err(e) => tracing::warn!("Skipping unreadable turn: {}", e),
            }
        }
        Ok(turns)
    }
}

fn row_to_turn(row: &Row<'_>) -> rusqlite::Result<Turn> {
    let seq: i64 = row.get(0)?;
    let role: String = row.get(3)?;
    let metadata: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let metadata = metadata.and_then(|raw| match serde_json::from_str::<TurnMetadata>(&raw) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(seq, "Ignoring malformed turn metadata: {}", e);
            None
        }
    });

    Ok(Turn {
        seq,
        conversation_id: row.get(1)?,
        user_id: row.get(2)?,
        role,
        content: row.get(4)?,
        metadata,
        timestamp: parse_timestamp(&created_at),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl ConversationStore for SqliteStorage {
    fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        metadata: Option<&TurnMetadata>,
        user_id: Option<&str>,
    ) -> Result<()> {
        let metadata_json = metadata
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize turn metadata")
            .map_err(|e| VyparError::Storage(e.to_string()))?;

        // Fixed-width timestamps keep lexical order equal to time order.
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO turns (conversation_id, user_id, role, content, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                conversation_id,
                user_id,
                role.as_str(),
                content,
                metadata_json,
                now
            ],
        )
        .context("Failed to insert turn")
        .map_err(|e| VyparError::Storage(e.to_string()))?;

        Ok(())
    }

    fn recent_history(&self, filter: HistoryFilter<'_>, limit: usize) -> Result<Vec<Turn>> {
        let mut turns = self.query_turns(filter, Some(limit))?;
        turns.reverse();
        Ok(turns)
    }

    fn full_history(&self, filter: HistoryFilter<'_>) -> Result<Vec<Turn>> {
        self.query_turns(filter, None)
    }

    fn latest_conversation_for_user(&self, user_id: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT conversation_id FROM turns WHERE user_id = ?
             ORDER BY created_at DESC, seq DESC LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to query latest conversation")
        .map_err(|e| VyparError::Storage(e.to_string()).into())
    }

    fn list_conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT conversation_id, MAX(user_id), COUNT(*), MAX(created_at) AS last
                 FROM turns GROUP BY conversation_id ORDER BY last DESC LIMIT ?",
            )
            .context("Failed to prepare statement")
            .map_err(|e| VyparError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let count: i64 = row.get(2)?;
                let last: String = row.get(3)?;
                Ok(ConversationSummary {
                    conversation_id: row.get(0)?,
                    user_id: row.get(1)?,
                    turn_count: count as usize,
                    last_activity: parse_timestamp(&last),
                })
            })
            .context("Failed to query conversations")
            .map_err(|e| VyparError::Storage(e.to_string()))?;

        let mut summaries = Vec::new();
        for row in rows {
            match row {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!("Skipping unreadable conversation summary: {}", e),
            }
        }
        Ok(summaries)
    }
}
