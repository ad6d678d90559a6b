//! Newslens Storage Layer
//!
//! Side-effect collaborators of the analysis service:
//!
//! - `SqliteRecordStore`: implements `AnalysisRepository` on SQLite
//! - `FilesystemObjectStore`: implements `ObjectStore` on a local directory
//!
//! # Examples
//!
//! ```no_run
//! use newslens_store::SqliteRecordStore;
//!
//! let store = SqliteRecordStore::new(":memory:").unwrap();
//! // Store is now ready to persist analysis records
//! ```

#![warn(missing_docs)]

mod object_store;

pub use object_store::{FilesystemObjectStore, ObjectMetadata, UPLOAD_PREFIX};

use newslens_domain::{
    AnalysisRecord, AnalysisRepository, AnalysisResult, CollaboratorError, NewAnalysisRecord,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection lock was poisoned by a panicking thread
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// SQLite-based implementation of `AnalysisRepository`
///
/// # Thread Safety
///
/// The connection is guarded by a mutex, so one store can be shared across
/// request handlers. Calls block; run them on a blocking thread from async
/// code.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Create a new SqliteRecordStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use newslens_store::SqliteRecordStore;
    ///
    /// let store = SqliteRecordStore::new("newslens.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        info!("Opened analysis record store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a record and return its id
    pub fn insert(&self, record: &NewAnalysisRecord) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let result = &record.result;

        conn.execute(
            "INSERT INTO analysis_records
             (original_filename, object_key, summary, nationalities, organizations, people, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &record.original_filename,
                &record.object_key,
                &result.summary,
                encode_list(&result.nationalities)?,
                encode_list(&result.organizations)?,
                encode_list(&result.people)?,
                unix_now() as i64,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted analysis record {}", id);
        Ok(id)
    }

    /// Fetch a record by id
    pub fn find(&self, id: i64) -> Result<Option<AnalysisRecord>, StoreError> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                "SELECT id, original_filename, object_key, summary, nationalities, organizations, people, created_at
                 FROM analysis_records WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM analysis_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl AnalysisRepository for SqliteRecordStore {
    fn save(&self, record: &NewAnalysisRecord) -> Result<i64, CollaboratorError> {
        self.insert(record)
            .map_err(|e| CollaboratorError::Persistence(e.to_string()))
    }

    fn get(&self, id: i64) -> Result<Option<AnalysisRecord>, CollaboratorError> {
        self.find(id)
            .map_err(|e| CollaboratorError::Persistence(e.to_string()))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    Ok(AnalysisRecord {
        id: row.get(0)?,
        original_filename: row.get(1)?,
        object_key: row.get(2)?,
        result: AnalysisResult {
            summary: row.get(3)?,
            nationalities: decode_list(row, 4)?,
            organizations: decode_list(row, 5)?,
            people: decode_list(row, 6)?,
        },
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn encode_list(items: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(items).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn decode_list(row: &Row<'_>, index: usize) -> rusqlite::Result<Vec<String>> {
    let json: String = row.get(index)?;
    serde_json::from_str(&json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
