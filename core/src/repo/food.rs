use chrono::NaiveDate;
use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::codec;
use crate::error::Result;
use crate::models::{FoodEntry, MacroTotals};
use crate::schema::{FOOD_ENTRIES, TableSchema};

pub type FoodEntryRepository = Repository<FoodEntry>;

impl Entity for FoodEntry {
    const TABLE: &'static TableSchema = &FOOD_ENTRIES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .opt_text("brand", self.brand.as_deref())
            .opt_text("barcode", self.barcode.as_deref())
            .date("date", self.date)
            .instant("timestamp", self.timestamp)
            .text("meal_type", &self.meal_type)
            .text("serving_size", &self.serving_size)
            .text("serving_unit", &self.serving_unit)
            .real("serving_count", self.serving_count)?
            .real("calories", self.calories)?
            .real("protein", self.protein)?
            .real("carbs", self.carbs)?
            .real("fat", self.fat)?
            .opt_real("fiber", self.fiber)?
            .opt_real("sugar", self.sugar)?
            .opt_real("sodium", self.sodium)?;
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.get("name")?,
            brand: row.opt("brand")?,
            barcode: row.opt("barcode")?,
            date: row.date("date")?,
            timestamp: row.instant("timestamp")?,
            meal_type: row.get("meal_type")?,
            serving_size: row.get("serving_size")?,
            serving_unit: row.get("serving_unit")?,
            serving_count: row.get("serving_count")?,
            calories: row.get("calories")?,
            protein: row.get("protein")?,
            carbs: row.get("carbs")?,
            fat: row.get("fat")?,
            fiber: row.opt("fiber")?,
            sugar: row.opt("sugar")?,
            sodium: row.opt("sodium")?,
        })
    }
}

impl Repository<FoodEntry> {
    /// Newest first.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        self.query_list(
            "WHERE date = ?1 ORDER BY timestamp DESC",
            params![codec::encode_date(date)],
        )
    }

    pub fn entries_for_meal(&self, meal_type: &str, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        self.query_list(
            "WHERE meal_type = ?1 AND date = ?2 ORDER BY timestamp DESC",
            params![meal_type, codec::encode_date(date)],
        )
    }

    pub fn total_calories_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        self.scaled_sum("calories", date)
    }

    pub fn total_protein_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        self.scaled_sum("protein", date)
    }

    pub fn total_carbs_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        self.scaled_sum("carbs", date)
    }

    pub fn total_fat_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        self.scaled_sum("fat", date)
    }

    /// All four macro totals in one pass; `None` when nothing was logged.
    pub fn macro_totals_for_date(&self, date: NaiveDate) -> Result<Option<MacroTotals>> {
        self.store().read(|conn| {
            let totals = conn.query_row(
                "SELECT COUNT(*),
                        SUM(calories * serving_count), SUM(protein * serving_count),
                        SUM(carbs * serving_count), SUM(fat * serving_count)
                 FROM food_entries WHERE date = ?1",
                params![codec::encode_date(date)],
                |row| {
                    let rows: i64 = row.get(0)?;
                    if rows == 0 {
                        return Ok(None);
                    }
                    Ok(Some(MacroTotals {
                        calories: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                        protein: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        carbs: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                        fat: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                    }))
                },
            )?;
            Ok(totals)
        })
    }

    // `column` is always one of the four macro column names above.
    fn scaled_sum(&self, column: &str, date: NaiveDate) -> Result<Option<f64>> {
        let sql = format!("SELECT SUM({column} * serving_count) FROM food_entries WHERE date = ?1");
        self.scalar(&sql, params![codec::encode_date(date)])
    }
}
