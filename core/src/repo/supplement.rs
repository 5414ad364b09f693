use chrono::NaiveDate;
use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::codec;
use crate::error::Result;
use crate::models::SupplementEntry;
use crate::schema::{SUPPLEMENT_ENTRIES, TableSchema};

pub type SupplementEntryRepository = Repository<SupplementEntry>;

impl Entity for SupplementEntry {
    const TABLE: &'static TableSchema = &SUPPLEMENT_ENTRIES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .opt_text("brand", self.brand.as_deref())
            .date("date", self.date)
            .instant("timestamp", self.timestamp)
            .text("serving_size", &self.serving_size)
            .text("serving_unit", &self.serving_unit)
            .blob("image_data", self.image_data.as_deref())
            .map("nutrients", &self.nutrients)?;
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.get("name")?,
            brand: row.opt("brand")?,
            date: row.date("date")?,
            timestamp: row.instant("timestamp")?,
            serving_size: row.get("serving_size")?,
            serving_unit: row.get("serving_unit")?,
            image_data: row.blob("image_data")?,
            nutrients: row.map("nutrients")?,
        })
    }
}

impl Repository<SupplementEntry> {
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<SupplementEntry>> {
        self.query_list(
            "WHERE date = ?1 ORDER BY timestamp DESC",
            params![codec::encode_date(date)],
        )
    }

    /// Every supplement name ever logged, once each, alphabetically.
    pub fn all_names(&self) -> Result<Vec<String>> {
        self.store().read(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT name FROM supplement_entries ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{NutrientMap, Timestamp};
    use crate::repo::tests::{assert_round_trip, assert_row_matches_schema};
    use crate::store::Store;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn supplement(name: &str, date: NaiveDate, millis: i64) -> SupplementEntry {
        SupplementEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            brand: None,
            date,
            timestamp: Timestamp::from_millis(millis).unwrap(),
            serving_size: "1".to_string(),
            serving_unit: "tablet".to_string(),
            image_data: None,
            nutrients: NutrientMap::new(),
        }
    }

    fn repo() -> SupplementEntryRepository {
        Repository::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn test_row_matches_schema() {
        assert_row_matches_schema(&supplement("Zinc", day(1), 0));
    }

    #[test]
    fn test_round_trip_with_nutrients_and_image() {
        let repo = repo();
        let mut multi = supplement("Multivitamin", day(2), 1_704_153_600_000);
        multi.brand = Some("Centrum".to_string());
        multi.image_data = Some(vec![0x89, b'P', b'N', b'G', 0, 255]);
        multi.nutrients.insert("vitamin c".to_string(), 90.0);
        multi.nutrients.insert("iron".to_string(), 18.0);
        multi.nutrients.insert("b12; \"methyl\"".to_string(), 0.0024);
        assert_round_trip(&repo, &multi);

        let empty = supplement("Fish oil", day(2), 0);
        assert_round_trip(&repo, &empty);
    }

    #[test]
    fn test_non_finite_nutrient_is_rejected_before_writing() {
        let repo = repo();
        let mut bad = supplement("Mystery", day(2), 0);
        bad.nutrients.insert("x".to_string(), f64::INFINITY);
        assert!(matches!(
            repo.insert(&bad),
            Err(StoreError::MalformedMap { .. })
        ));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_entries_for_date_and_names() {
        let repo = repo();
        let morning = supplement("Zinc", day(3), 1_000);
        let evening = supplement("Magnesium", day(3), 8_000);
        repo.insert(&morning).unwrap();
        repo.insert(&evening).unwrap();
        repo.insert(&supplement("Zinc", day(4), 9_000)).unwrap();

        assert_eq!(repo.entries_for_date(day(3)).unwrap(), vec![evening, morning]);
        assert_eq!(repo.all_names().unwrap(), vec!["Magnesium", "Zinc"]);
    }
}
