//! Generic repository over the ten entity families.
//!
//! Each family implements [`Entity`] (its table plus row mapping) and adds its
//! own read queries as an inherent `impl Repository<Family>` block in its
//! module. Insert, update, delete and point lookup live here once.

use std::marker::PhantomData;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, Value};
use rusqlite::{Params, Row, params};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::codec;
use crate::error::{Result, StoreError};
use crate::models::{NutrientMap, Timestamp};
use crate::schema::TableSchema;
use crate::store::Store;

pub mod custom_food;
pub mod custom_recipe;
pub mod exercise;
pub mod favorite_recipe;
pub mod food;
pub mod grocery_list;
pub mod meal_plan;
pub mod supplement;
pub mod water;
pub mod weight;

pub use custom_food::CustomFoodRepository;
pub use custom_recipe::CustomRecipeRepository;
pub use exercise::ExerciseEntryRepository;
pub use favorite_recipe::FavoriteRecipeRepository;
pub use food::FoodEntryRepository;
pub use grocery_list::GroceryListRepository;
pub use meal_plan::MealPlanRepository;
pub use supplement::SupplementEntryRepository;
pub use water::WaterEntryRepository;
pub use weight::WeightEntryRepository;

/// A persisted record type: its table and its mapping to and from a row.
pub trait Entity: Sized {
    const TABLE: &'static TableSchema;

    fn id(&self) -> Uuid;

    /// Writes every column of the table, `id` included.
    fn write_row(&self, row: &mut RowWriter) -> Result<()>;

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self>;
}

// --- Row mapping helpers ---

/// Encoded column values of one entity, in column order.
#[derive(Debug, Default)]
pub struct RowWriter {
    values: Vec<(&'static str, Value)>,
}

impl RowWriter {
    fn push(&mut self, column: &'static str, value: Value) -> &mut Self {
        self.values.push((column, value));
        self
    }

    pub fn id(&mut self, column: &'static str, id: &Uuid) -> &mut Self {
        self.push(column, Value::Text(codec::encode_id(id)))
    }

    pub fn opt_id(&mut self, column: &'static str, id: Option<&Uuid>) -> &mut Self {
        self.push(column, id.map_or(Value::Null, |id| Value::Text(codec::encode_id(id))))
    }

    pub fn text(&mut self, column: &'static str, value: &str) -> &mut Self {
        self.push(column, Value::Text(value.to_string()))
    }

    pub fn opt_text(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        self.push(column, value.map_or(Value::Null, |v| Value::Text(v.to_string())))
    }

    pub fn real(&mut self, column: &'static str, value: f64) -> Result<&mut Self> {
        let value = codec::encode_real(column, value)?;
        Ok(self.push(column, Value::Real(value)))
    }

    pub fn opt_real(&mut self, column: &'static str, value: Option<f64>) -> Result<&mut Self> {
        match value {
            Some(value) => self.real(column, value),
            None => Ok(self.push(column, Value::Null)),
        }
    }

    pub fn int(&mut self, column: &'static str, value: impl Into<i64>) -> &mut Self {
        self.push(column, Value::Integer(value.into()))
    }

    pub fn opt_int(&mut self, column: &'static str, value: Option<i64>) -> &mut Self {
        self.push(column, value.map_or(Value::Null, Value::Integer))
    }

    pub fn instant(&mut self, column: &'static str, value: Timestamp) -> &mut Self {
        self.push(column, Value::Integer(codec::encode_instant(value)))
    }

    pub fn date(&mut self, column: &'static str, value: NaiveDate) -> &mut Self {
        self.push(column, Value::Text(codec::encode_date(value)))
    }

    pub fn flag(&mut self, column: &'static str, value: bool) -> &mut Self {
        self.push(column, Value::Integer(codec::encode_bool(value)))
    }

    pub fn list(&mut self, column: &'static str, items: &[String]) -> &mut Self {
        self.push(column, Value::Text(codec::encode_list(items)))
    }

    pub fn map(&mut self, column: &'static str, map: &NutrientMap) -> Result<&mut Self> {
        let text = codec::encode_map(map)?;
        Ok(self.push(column, Value::Text(text)))
    }

    pub fn blob(&mut self, column: &'static str, value: Option<&[u8]>) -> &mut Self {
        self.push(column, value.map_or(Value::Null, |b| Value::Blob(b.to_vec())))
    }

    fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(c, _)| *c)
    }
}

/// Typed, null-checked access to one result row of an entity table.
///
/// Required accessors turn SQL `NULL` into [`StoreError::InconsistentRow`]
/// rather than a default value.
pub struct RowReader<'a, 'stmt> {
    row: &'a Row<'stmt>,
    table: &'static str,
}

impl<'a, 'stmt> RowReader<'a, 'stmt> {
    pub fn new(row: &'a Row<'stmt>, table: &'static str) -> Self {
        Self { row, table }
    }

    pub fn get<T: FromSql>(&self, column: &'static str) -> Result<T> {
        self.row
            .get::<_, Option<T>>(column)?
            .ok_or(StoreError::InconsistentRow {
                table: self.table,
                column,
            })
    }

    pub fn opt<T: FromSql>(&self, column: &'static str) -> Result<Option<T>> {
        Ok(self.row.get(column)?)
    }

    pub fn id(&self, column: &'static str) -> Result<Uuid> {
        codec::decode_id(&self.get::<String>(column)?)
    }

    pub fn opt_id(&self, column: &'static str) -> Result<Option<Uuid>> {
        self.opt::<String>(column)?
            .map(|text| codec::decode_id(&text))
            .transpose()
    }

    pub fn instant(&self, column: &'static str) -> Result<Timestamp> {
        codec::decode_instant(self.get(column)?)
    }

    pub fn date(&self, column: &'static str) -> Result<NaiveDate> {
        codec::decode_date(&self.get::<String>(column)?)
    }

    pub fn flag(&self, column: &'static str) -> Result<bool> {
        Ok(codec::decode_bool(self.get(column)?))
    }

    pub fn list(&self, column: &'static str) -> Result<Vec<String>> {
        codec::decode_list(&self.get::<String>(column)?)
    }

    pub fn map(&self, column: &'static str) -> Result<NutrientMap> {
        codec::decode_map(&self.get::<String>(column)?)
    }

    pub fn blob(&self, column: &'static str) -> Result<Option<Vec<u8>>> {
        self.opt(column)
    }
}

/// Escapes LIKE wildcards so `query` matches as a literal substring.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Filter on a boolean column with the same reading as [`codec::decode_bool`]:
/// any non-zero value is true.
pub(crate) fn flag_filter(column: &str, value: bool) -> String {
    if value {
        format!("{column} != 0")
    } else {
        format!("{column} = 0")
    }
}

fn select_sql(table: &TableSchema) -> String {
    let columns: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
    format!("SELECT {} FROM {}", columns.join(", "), table.name)
}

fn encode<E: Entity>(entity: &E) -> Result<RowWriter> {
    let mut row = RowWriter::default();
    entity.write_row(&mut row)?;
    Ok(row)
}

// --- Repository ---

/// Persistence operations for one entity family, sharing the store's single
/// connection.
pub struct Repository<E> {
    store: Store,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Inserts one row. An existing row with the same id is a `Conflict`.
    pub fn insert(&self, entity: &E) -> Result<()> {
        let table = E::TABLE.name;
        let id = entity.id();
        let row = encode(entity)?;

        let columns: Vec<&str> = row.columns().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        self.store.write(|tx| {
            tx.execute(
                &sql,
                rusqlite::params_from_iter(row.values.iter().map(|(_, v)| v)),
            )
            .map_err(|e| StoreError::from_insert(e, table, id))?;
            Ok(())
        })?;
        debug!(table, %id, "inserted");
        Ok(())
    }

    /// Replaces every column of the row keyed by `entity`'s id.
    ///
    /// Best effort: a missing row is not an error. Use [`Self::try_update`]
    /// to find out whether anything matched.
    pub fn update(&self, entity: &E) -> Result<()> {
        self.try_update(entity).map(|_| ())
    }

    /// Like [`Self::update`], returning whether a row with the id existed.
    pub fn try_update(&self, entity: &E) -> Result<bool> {
        let table = E::TABLE.name;
        let key = E::TABLE.primary_key();
        let id = entity.id();
        let row = encode(entity)?;

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for (column, value) in row.values {
            if column != key {
                values.push(value);
                assignments.push(format!("{column} = ?{}", values.len()));
            }
        }
        values.push(Value::Text(codec::encode_id(&id)));
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key} = ?{}",
            assignments.join(", "),
            values.len()
        );

        let changed = self
            .store
            .write(|tx| Ok(tx.execute(&sql, rusqlite::params_from_iter(values.iter()))?))?;
        debug!(table, %id, rows = changed, "updated");
        Ok(changed > 0)
    }

    /// Removes the row keyed by `entity`'s id; absent rows are not an error.
    pub fn delete(&self, entity: &E) -> Result<()> {
        self.delete_by_id(&entity.id()).map(|_| ())
    }

    /// Returns whether a row was removed.
    pub fn delete_by_id(&self, id: &Uuid) -> Result<bool> {
        let table = E::TABLE.name;
        let sql = format!("DELETE FROM {table} WHERE {} = ?1", E::TABLE.primary_key());
        let removed = self
            .store
            .write(|tx| Ok(tx.execute(&sql, params![codec::encode_id(id)])?))?;
        debug!(table, %id, rows = removed, "deleted");
        Ok(removed > 0)
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<E>> {
        let clause = format!("WHERE {} = ?1", E::TABLE.primary_key());
        self.query_one(&clause, params![codec::encode_id(id)])
    }

    pub fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE.name);
        Ok(self.scalar(&sql, [])?.unwrap_or(0))
    }

    /// Runs `SELECT <all columns> FROM <table> <clause>` and decodes every row.
    pub(crate) fn query_list<P: Params>(&self, clause: &str, params: P) -> Result<Vec<E>> {
        let sql = format!("{} {clause}", select_sql(E::TABLE));
        trace!(sql = %sql, "query");
        self.store.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params)?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                entities.push(E::read_row(&RowReader::new(row, E::TABLE.name))?);
            }
            Ok(entities)
        })
    }

    pub(crate) fn query_one<P: Params>(&self, clause: &str, params: P) -> Result<Option<E>> {
        let sql = format!("{} {clause}", select_sql(E::TABLE));
        trace!(sql = %sql, "query");
        self.store.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params)?;
            if let Some(row) = rows.next()? {
                Ok(Some(E::read_row(&RowReader::new(row, E::TABLE.name))?))
            } else {
                Ok(None)
            }
        })
    }

    /// First column of a single-row query; `None` when it is NULL, which is
    /// what `SUM` yields over zero rows.
    pub(crate) fn scalar<T: FromSql, P: Params>(&self, sql: &str, params: P) -> Result<Option<T>> {
        self.store
            .read(|conn| Ok(conn.query_row(sql, params, |row| row.get::<_, Option<T>>(0))?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::GroceryList;

    /// Asserts that an entity writes exactly the schema's columns, in order.
    pub(crate) fn assert_row_matches_schema<E: Entity>(entity: &E) {
        let row = encode(entity).unwrap();
        let written: Vec<&str> = row.columns().collect();
        let expected: Vec<&str> = E::TABLE.columns.iter().map(|c| c.name).collect();
        assert_eq!(written, expected, "{}", E::TABLE.name);
    }

    /// Asserts insert → get returns the same value.
    pub(crate) fn assert_round_trip<E: Entity + PartialEq + std::fmt::Debug>(
        repo: &Repository<E>,
        entity: &E,
    ) {
        repo.insert(entity).unwrap();
        assert_eq!(repo.get(&entity.id()).unwrap().as_ref(), Some(entity));
    }

    fn list(name: &str) -> GroceryList {
        GroceryList {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_date: Timestamp::now(),
            is_completed: false,
            items: vec!["milk".to_string(), "eggs".to_string()],
        }
    }

    fn repo() -> Repository<GroceryList> {
        Repository::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn test_insert_conflict_leaves_original() {
        let repo = repo();
        let original = list("Weekly");
        repo.insert(&original).unwrap();

        let mut dup = list("Other");
        dup.id = original.id;
        match repo.insert(&dup) {
            Err(StoreError::Conflict { table, id }) => {
                assert_eq!(table, "grocery_lists");
                assert_eq!(id, original.id);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(repo.get(&original.id).unwrap(), Some(original));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_update_replaces_whole_row() {
        let repo = repo();
        let mut entity = list("Weekly");
        repo.insert(&entity).unwrap();

        entity.name = "Party".to_string();
        entity.items = vec!["chips".to_string()];
        entity.is_completed = true;
        repo.update(&entity).unwrap();

        assert_eq!(repo.get(&entity.id).unwrap(), Some(entity));
    }

    #[test]
    fn test_update_missing_row_is_best_effort() {
        let repo = repo();
        let entity = list("Ghost");
        repo.update(&entity).unwrap();
        assert!(!repo.try_update(&entity).unwrap());
        assert_eq!(repo.get(&entity.id).unwrap(), None);

        repo.insert(&entity).unwrap();
        assert!(repo.try_update(&entity).unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let repo = repo();
        let entity = list("Weekly");
        repo.insert(&entity).unwrap();

        repo.delete(&entity).unwrap();
        repo.delete(&entity).unwrap();
        assert_eq!(repo.get(&entity.id).unwrap(), None);
        assert!(!repo.delete_by_id(&entity.id).unwrap());
    }

    #[test]
    fn test_update_only_touches_matching_row() {
        let repo = repo();
        let a = list("A");
        let mut b = list("B");
        repo.insert(&a).unwrap();
        repo.insert(&b).unwrap();

        b.name = "B2".to_string();
        repo.update(&b).unwrap();
        assert_eq!(repo.get(&a.id).unwrap(), Some(a));
        assert_eq!(repo.get(&b.id).unwrap().unwrap().name, "B2");
    }

    #[test]
    fn test_get_absent_and_count() {
        let repo = repo();
        assert_eq!(repo.get(&Uuid::new_v4()).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 0);
        repo.insert(&list("A")).unwrap();
        repo.insert(&list("B")).unwrap();
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_malformed_stored_id_is_reported() {
        let repo = repo();
        repo.store()
            .write(|tx| {
                tx.execute(
                    "INSERT INTO grocery_lists (id, name, created_date) VALUES ('bogus', 'x', 0)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        let err = repo.query_list("", []).unwrap_err();
        assert!(matches!(err, StoreError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_malformed_stored_list_is_reported() {
        let repo = repo();
        let entity = list("Weekly");
        repo.insert(&entity).unwrap();
        repo.store()
            .write(|tx| {
                tx.execute("UPDATE grocery_lists SET items = 'milk|||eggs'", [])?;
                Ok(())
            })
            .unwrap();
        let err = repo.get(&entity.id).unwrap_err();
        assert!(matches!(err, StoreError::MalformedList { .. }));
    }

    #[test]
    fn test_row_reader_null_in_required_column() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT NULL AS name, 'x' AS brand").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        let reader = RowReader::new(row, "custom_foods");

        match reader.get::<String>("name") {
            Err(StoreError::InconsistentRow { table, column }) => {
                assert_eq!(table, "custom_foods");
                assert_eq!(column, "name");
            }
            other => panic!("expected InconsistentRow, got {other:?}"),
        }
        assert_eq!(reader.opt::<String>("name").unwrap(), None);
        assert_eq!(reader.opt::<String>("brand").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("oat"), "%oat%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_flag_filter_matches_decode_bool() {
        assert_eq!(flag_filter("is_favorite", true), "is_favorite != 0");
        assert_eq!(flag_filter("is_favorite", false), "is_favorite = 0");
    }

    #[test]
    fn test_writes_through_clones_share_connection() {
        let repo = repo();
        let other = repo.clone();
        let entity = list("Weekly");
        other.insert(&entity).unwrap();
        assert_eq!(repo.get(&entity.id).unwrap(), Some(entity));
    }
}
