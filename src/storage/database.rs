//! Database operations using rusqlite.
//!
//! Owns the SQLite connection, applies schema migrations and hands out
//! connections and write transactions to the stores.

use crate::storage::schema::{CURRENT_VERSION, MIGRATIONS, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Current schema version, 0 for a fresh database.
    pub fn schema_version(&self) -> Result<i32, DatabaseError> {
        read_schema_version(&self.conn)
    }

    /// Apply every migration newer than the stored version.
    fn migrate(&mut self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        if self.schema_version()? >= CURRENT_VERSION {
            return Ok(());
        }

        // Re-read under the write lock in case another connection migrated first
        let tx = self.transaction()?;
        let from = read_schema_version(&tx)?;

        for (index, sql) in MIGRATIONS.iter().enumerate().skip(from.max(0) as usize) {
            let version = index as i32 + 1;
            tx.execute_batch(sql)
                .map_err(|e| DatabaseError::MigrationFailed(format!("v{version}: {e}")))?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![version, format_timestamp(&Utc::now())],
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        }
        tx.commit()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        if from < CURRENT_VERSION {
            tracing::info!(from, to = CURRENT_VERSION, "Database migrated");
        }
        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction.
    ///
    /// The write lock is taken up front so that a read-modify-write sequence
    /// for a user cannot interleave with another writer.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, DatabaseError> {
        self.conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }
}

fn read_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

/// Format a timestamp for storage.
///
/// Fixed precision keeps text ordering identical to chronological ordering.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("bad timestamp {s:?}: {e}")))
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::ConstraintViolation(msg.unwrap_or_else(|| err.to_string()))
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        DatabaseError::SerializationError(e.to_string())
    }
}
