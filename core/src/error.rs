use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Every failure the persistence engine can surface to a caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed identifier {value:?}: {source}")]
    MalformedIdentifier {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("malformed timestamp {value:?}")]
    MalformedTimestamp { value: String },

    #[error("malformed list: {reason}")]
    MalformedList { reason: String },

    #[error("malformed map: {reason}")]
    MalformedMap { reason: String },

    /// NaN and the infinities have no stored form; SQLite writes NaN as NULL.
    #[error("malformed number in column {column}: {value} is not finite")]
    MalformedNumber { column: &'static str, value: f64 },

    /// A NOT NULL column came back as NULL. The physical store no longer
    /// matches the entity contract; never retried.
    #[error("inconsistent row in {table}: column {column} is NULL")]
    InconsistentRow {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} already contains a row with id {id}")]
    Conflict { table: &'static str, id: Uuid },

    #[error("storage failure: {0}")]
    StorageIo(#[from] rusqlite::Error),

    #[error("schema mismatch in {table}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        table: String,
        expected: String,
        found: String,
    },
}

impl StoreError {
    /// Maps a failed single-row insert: primary-key collisions become
    /// `Conflict`, everything else stays a storage failure.
    pub(crate) fn from_insert(err: rusqlite::Error, table: &'static str, id: Uuid) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Self::Conflict { table, id }
            }
            _ => Self::StorageIo(err),
        }
    }

    /// True for errors that indicate the stored data or layout has drifted
    /// from the code, as opposed to transient storage trouble.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentifier { .. }
                | Self::MalformedTimestamp { .. }
                | Self::MalformedList { .. }
                | Self::MalformedMap { .. }
                | Self::MalformedNumber { .. }
                | Self::InconsistentRow { .. }
                | Self::SchemaMismatch { .. }
        )
    }
}
