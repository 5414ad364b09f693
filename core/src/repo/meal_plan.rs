use chrono::NaiveDate;
use rusqlite::params;
use tracing::debug;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::codec;
use crate::error::Result;
use crate::models::MealPlan;
use crate::schema::{MEAL_PLANS, TableSchema};

pub type MealPlanRepository = Repository<MealPlan>;

impl Entity for MealPlan {
    const TABLE: &'static TableSchema = &MEAL_PLANS;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .date("date", self.date)
            .text("meal_type", &self.meal_type)
            .opt_id("recipe_id", self.recipe_id.as_ref())
            .text("recipe_name", &self.recipe_name)
            .int("servings", self.servings)
            .opt_text("notes", self.notes.as_deref());
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            date: row.date("date")?,
            meal_type: row.get("meal_type")?,
            recipe_id: row.opt_id("recipe_id")?,
            recipe_name: row.get("recipe_name")?,
            servings: row.get("servings")?,
            notes: row.opt("notes")?,
        })
    }
}

impl Repository<MealPlan> {
    pub fn plans_for_date(&self, date: NaiveDate) -> Result<Vec<MealPlan>> {
        self.query_list(
            "WHERE date = ?1 ORDER BY meal_type",
            params![codec::encode_date(date)],
        )
    }

    /// Both ends inclusive, ordered by date then meal type.
    pub fn plans_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<MealPlan>> {
        self.query_list(
            "WHERE date BETWEEN ?1 AND ?2 ORDER BY date, meal_type",
            params![codec::encode_date(start), codec::encode_date(end)],
        )
    }

    /// Removes every plan on `date` in one transaction; returns how many.
    pub fn delete_all_for_date(&self, date: NaiveDate) -> Result<usize> {
        let removed = self.store().write(|tx| {
            Ok(tx.execute(
                "DELETE FROM meal_plans WHERE date = ?1",
                params![codec::encode_date(date)],
            )?)
        })?;
        debug!(table = "meal_plans", %date, rows = removed, "cleared day");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::{assert_round_trip, assert_row_matches_schema};
    use crate::store::Store;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn plan(date: NaiveDate, meal_type: &str, recipe_name: &str) -> MealPlan {
        MealPlan {
            id: Uuid::new_v4(),
            date,
            meal_type: meal_type.to_string(),
            recipe_id: None,
            recipe_name: recipe_name.to_string(),
            servings: 1,
            notes: None,
        }
    }

    fn repo() -> MealPlanRepository {
        Repository::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn test_row_matches_schema() {
        assert_row_matches_schema(&plan(day(1), "lunch", "Salad"));
    }

    #[test]
    fn test_round_trip_with_recipe_reference() {
        let repo = repo();
        let mut p = plan(day(1), "dinner", "Lasagna");
        p.recipe_id = Some(Uuid::new_v4());
        p.servings = 3;
        p.notes = Some("double cheese".to_string());
        assert_round_trip(&repo, &p);
        assert_round_trip(&repo, &plan(day(1), "lunch", "Leftovers"));
    }

    #[test]
    fn test_dangling_recipe_reference_is_allowed() {
        let repo = repo();
        let mut p = plan(day(1), "dinner", "Gone");
        p.recipe_id = Some(Uuid::new_v4());
        repo.insert(&p).unwrap();
        assert_eq!(repo.get(&p.id).unwrap(), Some(p));
    }

    #[test]
    fn test_plans_for_date_and_range() {
        let repo = repo();
        let lunch = plan(day(2), "lunch", "Wrap");
        let breakfast = plan(day(2), "breakfast", "Eggs");
        let dinner = plan(day(3), "dinner", "Curry");
        let later = plan(day(8), "dinner", "Pizza");
        for p in [&lunch, &breakfast, &dinner, &later] {
            repo.insert(p).unwrap();
        }

        assert_eq!(
            repo.plans_for_date(day(2)).unwrap(),
            vec![breakfast.clone(), lunch.clone()]
        );
        assert_eq!(
            repo.plans_in_range(day(2), day(3)).unwrap(),
            vec![breakfast, lunch, dinner]
        );
        assert!(repo.plans_for_date(day(4)).unwrap().is_empty());
    }

    #[test]
    fn test_delete_all_for_date() {
        let repo = repo();
        repo.insert(&plan(day(2), "lunch", "Wrap")).unwrap();
        repo.insert(&plan(day(2), "dinner", "Soup")).unwrap();
        let kept = plan(day(3), "dinner", "Curry");
        repo.insert(&kept).unwrap();

        assert_eq!(repo.delete_all_for_date(day(2)).unwrap(), 2);
        assert_eq!(repo.delete_all_for_date(day(2)).unwrap(), 0);
        assert_eq!(repo.plans_in_range(day(1), day(30)).unwrap(), vec![kept]);
    }
}
