//! Startup validation of the physical store against [`crate::schema`].
//!
//! A store without a marker gets every table created and a marker recorded.
//! A store with a marker is compared table by table; any structural drift is
//! a fatal [`StoreError::SchemaMismatch`]. There is no automatic migration.

use std::fmt::Write as _;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, warn};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::models::Timestamp;
use crate::schema::{self, SCHEMA_MARKER_TABLE, SCHEMA_VERSION, TableSchema};

/// Persisted record of the schema a store was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMarker {
    pub version: i64,
    pub fingerprint: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaState {
    #[default]
    Unvalidated,
    Validated(SchemaMarker),
}

#[derive(Debug, Default)]
pub struct SchemaGuard {
    state: SchemaState,
}

impl SchemaGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SchemaState {
        &self.state
    }

    #[must_use]
    pub fn marker(&self) -> Option<&SchemaMarker> {
        match &self.state {
            SchemaState::Validated(marker) => Some(marker),
            SchemaState::Unvalidated => None,
        }
    }

    /// Creates or validates the schema. On error the guard stays
    /// `Unvalidated` and the store must not be used.
    pub fn validate(&mut self, conn: &mut Connection) -> Result<SchemaMarker> {
        let marker = match read_marker(conn)? {
            None => create_schema(conn)?,
            Some(marker) => {
                check_tables(conn, true)?;
                check_marker(&marker)?;
                debug!(
                    version = marker.version,
                    fingerprint = %marker.fingerprint,
                    "schema validated"
                );
                marker
            }
        };
        self.state = SchemaState::Validated(marker.clone());
        Ok(marker)
    }

    /// Drops every entity table and the marker, then recreates the schema
    /// from scratch. All data is lost.
    pub fn reset(&mut self, conn: &mut Connection) -> Result<SchemaMarker> {
        self.state = SchemaState::Unvalidated;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for table in schema::TABLES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", table.name))?;
        }
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {SCHEMA_MARKER_TABLE};
             PRAGMA user_version = 0;"
        ))?;
        tx.commit()?;
        debug!("schema dropped for reset");
        self.validate(conn)
    }
}

/// Deletes every row of every entity table in one transaction, then asks
/// SQLite to reclaim the freed pages. The schema and marker are kept.
///
/// Success is decided by the commit. A failed `VACUUM` afterwards is logged
/// and leaves the file at its old size with every table already empty.
pub fn clear_all(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut removed = 0;
    for table in schema::TABLES {
        removed += tx.execute(&format!("DELETE FROM {}", table.name), [])?;
    }
    tx.commit()?;
    debug!(rows = removed, "cleared all tables");
    if let Err(err) = conn.execute_batch("VACUUM") {
        warn!(error = %err, "vacuum after clear failed");
    }
    Ok(())
}

fn read_marker(conn: &Connection) -> Result<Option<SchemaMarker>> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![SCHEMA_MARKER_TABLE],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        if version != 0 {
            return Err(mismatch(
                SCHEMA_MARKER_TABLE,
                format!("marker table for version {SCHEMA_VERSION}"),
                format!("user_version {version} without a marker table"),
            ));
        }
        return Ok(None);
    }

    let row: Option<(Option<i64>, Option<String>, Option<i64>)> = conn
        .query_row(
            &format!("SELECT version, fingerprint, created_at FROM {SCHEMA_MARKER_TABLE} LIMIT 1"),
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((stored_version, fingerprint, created_at)) = row else {
        return Err(mismatch(
            SCHEMA_MARKER_TABLE,
            "one marker row".to_string(),
            "no rows".to_string(),
        ));
    };

    let inconsistent = |column| StoreError::InconsistentRow {
        table: SCHEMA_MARKER_TABLE,
        column,
    };
    let stored_version = stored_version.ok_or_else(|| inconsistent("version"))?;
    if stored_version != version {
        return Err(mismatch(
            SCHEMA_MARKER_TABLE,
            format!("user_version {stored_version}"),
            format!("user_version {version}"),
        ));
    }
    Ok(Some(SchemaMarker {
        version: stored_version,
        fingerprint: fingerprint.ok_or_else(|| inconsistent("fingerprint"))?,
        created_at: codec::decode_instant(created_at.ok_or_else(|| inconsistent("created_at"))?)?,
    }))
}

fn create_schema(conn: &mut Connection) -> Result<SchemaMarker> {
    let marker = SchemaMarker {
        version: SCHEMA_VERSION,
        fingerprint: schema::fingerprint(),
        created_at: Timestamp::now(),
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for table in schema::TABLES {
        tx.execute_batch(&table.create_table_sql())?;
    }
    // Tables left behind by another layout survive IF NOT EXISTS; catch them
    // before indexing them or letting the marker vouch for them.
    check_tables(&tx, false)?;
    for table in schema::TABLES {
        for sql in table.create_index_sql() {
            tx.execute_batch(&sql)?;
        }
    }
    check_tables(&tx, true)?;
    tx.execute_batch(&format!(
        "CREATE TABLE {SCHEMA_MARKER_TABLE} (
            version INTEGER NOT NULL,
            fingerprint TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        PRAGMA user_version = {SCHEMA_VERSION};"
    ))?;
    tx.execute(
        &format!(
            "INSERT INTO {SCHEMA_MARKER_TABLE} (version, fingerprint, created_at) VALUES (?1, ?2, ?3)"
        ),
        params![
            marker.version,
            marker.fingerprint,
            codec::encode_instant(marker.created_at)
        ],
    )?;
    tx.commit()?;

    debug!(
        version = marker.version,
        fingerprint = %marker.fingerprint,
        tables = schema::TABLES.len(),
        "schema created"
    );
    Ok(marker)
}

fn check_marker(marker: &SchemaMarker) -> Result<()> {
    if marker.version != SCHEMA_VERSION {
        return Err(mismatch(
            SCHEMA_MARKER_TABLE,
            format!("version {SCHEMA_VERSION}"),
            format!("version {}", marker.version),
        ));
    }
    let expected = schema::fingerprint();
    if marker.fingerprint != expected {
        return Err(mismatch(
            SCHEMA_MARKER_TABLE,
            format!("fingerprint {expected}"),
            format!("fingerprint {}", marker.fingerprint),
        ));
    }
    Ok(())
}

fn check_tables(conn: &Connection, with_indices: bool) -> Result<()> {
    for table in schema::TABLES {
        let mut found = describe_physical(conn, table.name)?;
        let mut expected = describe_expected(table);
        if !with_indices {
            found.indices.clear();
            expected.indices.clear();
        }
        if found != expected {
            return Err(mismatch(
                table.name,
                render(&expected),
                if found.columns.is_empty() {
                    "table missing".to_string()
                } else {
                    render(&found)
                },
            ));
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct ColumnShape {
    name: String,
    ty: String,
    not_null: bool,
    default: Option<String>,
    primary_key: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct TableShape {
    columns: Vec<ColumnShape>,
    /// `(index name, indexed columns)`, sorted by name.
    indices: Vec<(String, Vec<String>)>,
}

fn describe_expected(table: &TableSchema) -> TableShape {
    let columns = table
        .columns
        .iter()
        .map(|c| ColumnShape {
            name: c.name.to_string(),
            ty: c.ty.sql().to_string(),
            not_null: !c.nullable,
            default: c.default.map(str::to_string),
            primary_key: c.primary_key,
        })
        .collect();
    let mut indices: Vec<(String, Vec<String>)> = table
        .indices
        .iter()
        .map(|idx| {
            (
                idx.name.to_string(),
                idx.columns.iter().map(ToString::to_string).collect(),
            )
        })
        .collect();
    indices.sort();
    TableShape { columns, indices }
}

fn describe_physical(conn: &Connection, table: &str) -> Result<TableShape> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnShape {
                name: row.get(1)?,
                ty: row.get::<_, String>(2)?.to_uppercase(),
                not_null: row.get::<_, i64>(3)? != 0,
                default: row.get(4)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // origin 'c' = created by CREATE INDEX; skips the implicit pk/unique indices.
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({table})"))?;
    let names = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(3)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut indices = Vec::new();
    for (name, origin) in names {
        if origin != "c" {
            continue;
        }
        let mut stmt = conn.prepare(&format!("PRAGMA index_info({name})"))?;
        let mut cols: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        cols.sort();
        indices.push((name, cols.into_iter().map(|(_, c)| c).collect()));
    }
    indices.sort();

    Ok(TableShape { columns, indices })
}

fn render(shape: &TableShape) -> String {
    let mut out = String::new();
    for (i, c) in shape.columns.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", c.name, c.ty);
        if c.not_null {
            out.push_str(" NOT NULL");
        }
        if c.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if let Some(d) = &c.default {
            let _ = write!(out, " DEFAULT {d}");
        }
    }
    for (name, cols) in &shape.indices {
        let _ = write!(out, "; INDEX {name}({})", cols.join(", "));
    }
    out
}

fn mismatch(table: &str, expected: String, found: String) -> StoreError {
    warn!(table, %expected, %found, "schema mismatch");
    StoreError::SchemaMismatch {
        table: table.to_string(),
        expected,
        found,
    }
}
