use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter, flag_filter, like_pattern};
use crate::error::Result;
use crate::models::CustomFood;
use crate::schema::{CUSTOM_FOODS, TableSchema};

pub type CustomFoodRepository = Repository<CustomFood>;

impl Entity for CustomFood {
    const TABLE: &'static TableSchema = &CUSTOM_FOODS;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .opt_text("brand", self.brand.as_deref())
            .opt_text("barcode", self.barcode.as_deref())
            .opt_text("category", self.category.as_deref())
            .opt_text("source", self.source.as_deref())
            .opt_int("external_id", self.external_id)
            .flag("is_user_created", self.is_user_created)
            .instant("created_date", self.created_date)
            .text("serving_size", &self.serving_size)
            .text("serving_unit", &self.serving_unit)
            .real("calories", self.calories)?
            .real("protein", self.protein)?
            .real("carbs", self.carbs)?
            .real("fat", self.fat)?
            .opt_real("saturated_fat", self.saturated_fat)?
            .opt_real("fiber", self.fiber)?
            .opt_real("sugar", self.sugar)?
            .opt_real("sodium", self.sodium)?
            .opt_real("cholesterol", self.cholesterol)?
            .map("additional_nutrients", &self.additional_nutrients)?;
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.get("name")?,
            brand: row.opt("brand")?,
            barcode: row.opt("barcode")?,
            category: row.opt("category")?,
            source: row.opt("source")?,
            external_id: row.opt("external_id")?,
            is_user_created: row.flag("is_user_created")?,
            created_date: row.instant("created_date")?,
            serving_size: row.get("serving_size")?,
            serving_unit: row.get("serving_unit")?,
            calories: row.get("calories")?,
            protein: row.get("protein")?,
            carbs: row.get("carbs")?,
            fat: row.get("fat")?,
            saturated_fat: row.opt("saturated_fat")?,
            fiber: row.opt("fiber")?,
            sugar: row.opt("sugar")?,
            sodium: row.opt("sodium")?,
            cholesterol: row.opt("cholesterol")?,
            additional_nutrients: row.map("additional_nutrients")?,
        })
    }
}

impl Repository<CustomFood> {
    /// Foods whose name or brand contains `query`, alphabetically by name.
    pub fn search(&self, query: &str) -> Result<Vec<CustomFood>> {
        self.query_list(
            "WHERE name LIKE ?1 ESCAPE '\\' OR brand LIKE ?1 ESCAPE '\\' ORDER BY name",
            params![like_pattern(query)],
        )
    }

    pub fn by_barcode(&self, barcode: &str) -> Result<Option<CustomFood>> {
        self.query_one("WHERE barcode = ?1 LIMIT 1", params![barcode])
    }

    pub fn by_external_id(&self, external_id: i64) -> Result<Option<CustomFood>> {
        self.query_one("WHERE external_id = ?1 LIMIT 1", params![external_id])
    }

    /// Newest first.
    pub fn user_created(&self) -> Result<Vec<CustomFood>> {
        let clause = format!(
            "WHERE {} ORDER BY created_date DESC",
            flag_filter("is_user_created", true)
        );
        self.query_list(&clause, [])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutrientMap, Timestamp};
    use crate::repo::tests::{assert_round_trip, assert_row_matches_schema};
    use crate::store::Store;
    use uuid::Uuid;

    fn food(name: &str, brand: Option<&str>) -> CustomFood {
        CustomFood {
            id: Uuid::new_v4(),
            name: name.to_string(),
            brand: brand.map(ToString::to_string),
            barcode: None,
            category: None,
            source: None,
            external_id: None,
            is_user_created: true,
            created_date: Timestamp::from_millis(0).unwrap(),
            serving_size: "100".to_string(),
            serving_unit: "g".to_string(),
            calories: 100.0,
            protein: 1.0,
            carbs: 2.0,
            fat: 3.0,
            saturated_fat: None,
            fiber: None,
            sugar: None,
            sodium: None,
            cholesterol: None,
            additional_nutrients: NutrientMap::new(),
        }
    }

    fn repo() -> CustomFoodRepository {
        Repository::new(Store::open_in_memory().unwrap())
    }

    fn names(foods: &[CustomFood]) -> Vec<&str> {
        foods.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_row_matches_schema() {
        assert_row_matches_schema(&food("Tofu", None));
    }

    #[test]
    fn test_round_trip_all_fields() {
        let repo = repo();
        let mut full = food("Greek Yogurt", Some("Fage"));
        full.barcode = Some("0689544001720".to_string());
        full.category = Some("dairy".to_string());
        full.source = Some("usda".to_string());
        full.external_id = Some(170_894);
        full.is_user_created = false;
        full.created_date = Timestamp::from_millis(1_700_000_000_321).unwrap();
        full.saturated_fat = Some(0.1);
        full.fiber = Some(0.0);
        full.sugar = Some(3.6);
        full.sodium = Some(36.0);
        full.cholesterol = Some(5.0);
        full.additional_nutrients.insert("calcium".to_string(), 110.0);
        full.additional_nutrients.insert("potassium".to_string(), 141.0);
        assert_round_trip(&repo, &full);

        assert_round_trip(&repo, &food("Plain", None));
    }

    #[test]
    fn test_search_matches_name_or_brand_sorted() {
        let repo = repo();
        for f in [
            food("Rolled Oats", Some("Quaker")),
            food("Almond Milk", Some("Oatly")),
            food("Banana", None),
            food("Oat Bran", None),
        ] {
            repo.insert(&f).unwrap();
        }

        let found = repo.search("oat").unwrap();
        assert_eq!(names(&found), vec!["Almond Milk", "Oat Bran", "Rolled Oats"]);
        assert!(repo.search("kiwi").unwrap().is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let repo = repo();
        repo.insert(&food("100% Juice", None)).unwrap();
        repo.insert(&food("1000 Island", None)).unwrap();
        repo.insert(&food("snake_case", None)).unwrap();
        repo.insert(&food("snakeXcase", None)).unwrap();

        assert_eq!(names(&repo.search("100%").unwrap()), vec!["100% Juice"]);
        assert_eq!(names(&repo.search("e_c").unwrap()), vec!["snake_case"]);
    }

    #[test]
    fn test_lookup_by_barcode_and_external_id() {
        let repo = repo();
        let mut scanned = food("Cereal", None);
        scanned.barcode = Some("555".to_string());
        scanned.external_id = Some(42);
        repo.insert(&scanned).unwrap();

        assert_eq!(repo.by_barcode("555").unwrap(), Some(scanned.clone()));
        assert_eq!(repo.by_barcode("556").unwrap(), None);
        assert_eq!(repo.by_external_id(42).unwrap(), Some(scanned));
        assert_eq!(repo.by_external_id(43).unwrap(), None);
    }

    #[test]
    fn test_user_created_newest_first() {
        let repo = repo();
        let mut old = food("Old", None);
        old.created_date = Timestamp::from_millis(1_000).unwrap();
        let mut new = food("New", None);
        new.created_date = Timestamp::from_millis(2_000).unwrap();
        let mut imported = food("Imported", None);
        imported.is_user_created = false;
        for f in [&old, &new, &imported] {
            repo.insert(f).unwrap();
        }

        assert_eq!(repo.user_created().unwrap(), vec![new, old]);
    }
}
