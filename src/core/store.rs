// src/core/store.rs
//! Append-only SQLite ledger of clipboard entries
//!
//! Entries are keyed by content hash. Writing a hash that is already present
//! is a no-op, which is how duplicate clipboard content is dropped.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::core::error::StoreError;
use crate::core::types::{ClipboardEntry, ContentType, StoredEntry};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clipboard_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    app_name TEXT,
    app_bundle_id TEXT,
    timestamp TEXT NOT NULL,
    character_count INTEGER NOT NULL,
    word_count INTEGER NOT NULL,
    line_count INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    is_url INTEGER NOT NULL DEFAULT 0,
    is_email INTEGER NOT NULL DEFAULT 0,
    language_detected TEXT
)
"#;

const CREATE_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_clipboard_entries_timestamp ON clipboard_entries (timestamp)";

const INSERT_ENTRY: &str = r#"
INSERT INTO clipboard_entries (
    content, content_hash, app_name, app_bundle_id, timestamp,
    character_count, word_count, line_count, content_type,
    is_url, is_email, language_detected
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(content_hash) DO NOTHING
"#;

/// What happened to an entry handed to [`EntryStore::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Owner of the clipboard history database
#[derive(Debug, Clone)]
pub struct EntryStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl EntryStore {
    /// Open (creating if needed) the database at `path` and ensure the schema exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        // One connection keeps writes strictly ordered.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        let store = Self { pool, path };
        store.ensure_schema().await?;

        info!("🗄️  Clipboard store ready at {}", store.path.display());
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Schema)?;
        sqlx::query(CREATE_TIMESTAMP_INDEX)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Schema)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert an entry unless its hash is already stored
    pub async fn insert(&self, entry: &ClipboardEntry) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(INSERT_ENTRY)
            .bind(&entry.content)
            .bind(&entry.content_hash)
            .bind(&entry.app_name)
            .bind(&entry.app_bundle_id)
            .bind(entry.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .bind(entry.character_count as i64)
            .bind(entry.word_count as i64)
            .bind(entry.line_count as i64)
            .bind(entry.content_type.as_str())
            .bind(entry.is_url)
            .bind(entry.is_email)
            .bind(&entry.language_detected)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Insert {
                hash: entry.content_hash.clone(),
                source,
            })?;

        if result.rows_affected() == 0 {
            debug!(hash = entry.short_hash(), "Duplicate clipboard content ignored");
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clipboard_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn contains_hash(&self, content_hash: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM clipboard_entries WHERE content_hash = ?")
                .bind(content_hash)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: usize) -> Result<Vec<StoredEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM clipboard_entries ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_row).collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An [`EntryStore`] opened on first use.
///
/// A failed open is returned to the caller and attempted again on the next
/// write, so an unavailable database never has to stop the monitor.
#[derive(Debug)]
pub struct LazyStore {
    path: PathBuf,
    store: Option<EntryStore>,
}

impl LazyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// The open store, opening it now if needed
    pub async fn get(&mut self) -> Result<&EntryStore, StoreError> {
        let store = match self.store.take() {
            Some(store) => store,
            None => EntryStore::open(&self.path).await?,
        };
        Ok(self.store.insert(store))
    }

    pub async fn insert(&mut self, entry: &ClipboardEntry) -> Result<InsertOutcome, StoreError> {
        self.get().await?.insert(entry).await
    }
}

impl From<EntryStore> for LazyStore {
    fn from(store: EntryStore) -> Self {
        Self {
            path: store.path.clone(),
            store: Some(store),
        }
    }
}

impl From<PathBuf> for LazyStore {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

fn decode_row(row: &SqliteRow) -> Result<StoredEntry, StoreError> {
    let id: i64 = row.try_get("id")?;
    let malformed = |reason: String| StoreError::Decode { id, reason };

    let timestamp: String = row.try_get("timestamp")?;
    let captured_at = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| malformed(format!("bad timestamp {timestamp:?}: {e}")))?
        .with_timezone(&Utc);

    let content_type: String = row.try_get("content_type")?;
    let content_type = ContentType::from_str(&content_type).map_err(malformed)?;

    let count = |column: &str| -> Result<usize, StoreError> {
        let value: i64 = row.try_get(column)?;
        usize::try_from(value).map_err(|_| StoreError::Decode {
            id,
            reason: format!("negative {column}: {value}"),
        })
    };

    Ok(StoredEntry {
        id,
        entry: ClipboardEntry {
            content: row.try_get("content")?,
            content_hash: row.try_get("content_hash")?,
            app_name: row.try_get("app_name")?,
            app_bundle_id: row.try_get("app_bundle_id")?,
            captured_at,
            character_count: count("character_count")?,
            word_count: count("word_count")?,
            line_count: count("line_count")?,
            content_type,
            is_url: row.try_get("is_url")?,
            is_email: row.try_get("is_email")?,
            language_detected: row.try_get("language_detected")?,
        },
    })
}
