use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::FixedOffset;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::config::{StoreConfig, StoreLocation};
use crate::error::Result;
use crate::guard::{self, SchemaGuard, SchemaMarker};

/// Shared handle to the single store connection.
///
/// Cloning is cheap; every clone refers to the same connection. All access is
/// serialized by one mutex, so at most one transaction is ever open.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Handle>>,
    day_offset: FixedOffset,
}

struct Handle {
    conn: Connection,
    guard: SchemaGuard,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(&StoreConfig::file(path))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open_with(&StoreConfig::in_memory())
    }

    /// Opens the connection and runs the schema guard. A schema mismatch
    /// aborts the open; no handle is returned.
    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        let mut conn = match &config.location {
            StoreLocation::File(path) => {
                let conn = Connection::open(path)?;
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn
            }
            StoreLocation::InMemory => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout)?;

        let mut guard = SchemaGuard::new();
        let marker = guard.validate(&mut conn)?;
        debug!(
            location = ?config.location,
            schema_version = marker.version,
            "store opened"
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(Handle { conn, guard })),
            day_offset: config.day_offset,
        })
    }

    /// Runs `body` inside an IMMEDIATE transaction. Commits when it returns
    /// `Ok`; an `Err` or a panic drops the transaction, which rolls back.
    pub fn write<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut handle = self.lock();
        let tx = handle
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = body(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs `body` against the connection without opening a transaction.
    pub fn read<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let handle = self.lock();
        body(&handle.conn)
    }

    /// Empties every entity table and reclaims the space.
    pub fn clear_all(&self) -> Result<()> {
        let mut handle = self.lock();
        guard::clear_all(&mut handle.conn)
    }

    /// Drops and recreates the whole schema.
    pub fn reset(&self) -> Result<SchemaMarker> {
        let mut handle = self.lock();
        let Handle { conn, guard } = &mut *handle;
        guard.reset(conn)
    }

    #[must_use]
    pub fn schema_marker(&self) -> Option<SchemaMarker> {
        self.lock().guard.marker().cloned()
    }

    #[must_use]
    pub fn day_offset(&self) -> FixedOffset {
        self.day_offset
    }

    // A panic inside `write` has already rolled back by the time the lock is
    // seen poisoned, so the connection is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, Handle> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
