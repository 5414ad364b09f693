use std::path::Path;

use anyhow::Context as _;
use chrono::NaiveDate;
use rusqlite::params;
use tracing::debug;

use crate::codec;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::DailySummary;
use crate::repo::water;
use crate::repo::{
    CustomFoodRepository, CustomRecipeRepository, ExerciseEntryRepository,
    FavoriteRecipeRepository, FoodEntryRepository, GroceryListRepository, MealPlanRepository,
    Repository, SupplementEntryRepository, WaterEntryRepository, WeightEntryRepository,
};
use crate::store::Store;

/// One store plus a repository per entity family.
///
/// Safe to share between threads; every repository funnels through the same
/// store handle.
pub struct HealthService {
    store: Store,
    foods: FoodEntryRepository,
    exercises: ExerciseEntryRepository,
    supplements: SupplementEntryRepository,
    weights: WeightEntryRepository,
    water: WaterEntryRepository,
    custom_foods: CustomFoodRepository,
    custom_recipes: CustomRecipeRepository,
    favorite_recipes: FavoriteRecipeRepository,
    meal_plans: MealPlanRepository,
    grocery_lists: GroceryListRepository,
}

impl HealthService {
    pub fn new(db_path: &str) -> Result<Self> {
        Ok(Self::with_store(Store::open(Path::new(db_path))?))
    }

    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::with_store(Store::open_in_memory()?))
    }

    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_store(Store::open_with(config)?))
    }

    /// Opens the per-user database in the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        let config = StoreConfig::load()?;
        Self::open_with(&config).with_context(|| format!("Failed to open {:?}", config.location))
    }

    #[must_use]
    pub fn with_store(store: Store) -> Self {
        Self {
            foods: Repository::new(store.clone()),
            exercises: Repository::new(store.clone()),
            supplements: Repository::new(store.clone()),
            weights: Repository::new(store.clone()),
            water: Repository::new(store.clone()),
            custom_foods: Repository::new(store.clone()),
            custom_recipes: Repository::new(store.clone()),
            favorite_recipes: Repository::new(store.clone()),
            meal_plans: Repository::new(store.clone()),
            grocery_lists: Repository::new(store.clone()),
            store,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn foods(&self) -> &FoodEntryRepository {
        &self.foods
    }

    #[must_use]
    pub fn exercises(&self) -> &ExerciseEntryRepository {
        &self.exercises
    }

    #[must_use]
    pub fn supplements(&self) -> &SupplementEntryRepository {
        &self.supplements
    }

    #[must_use]
    pub fn weights(&self) -> &WeightEntryRepository {
        &self.weights
    }

    #[must_use]
    pub fn water(&self) -> &WaterEntryRepository {
        &self.water
    }

    #[must_use]
    pub fn custom_foods(&self) -> &CustomFoodRepository {
        &self.custom_foods
    }

    #[must_use]
    pub fn custom_recipes(&self) -> &CustomRecipeRepository {
        &self.custom_recipes
    }

    #[must_use]
    pub fn favorite_recipes(&self) -> &FavoriteRecipeRepository {
        &self.favorite_recipes
    }

    #[must_use]
    pub fn meal_plans(&self) -> &MealPlanRepository {
        &self.meal_plans
    }

    #[must_use]
    pub fn grocery_lists(&self) -> &GroceryListRepository {
        &self.grocery_lists
    }

    // --- Dashboard ---

    /// `date` as `YYYY-MM-DD`.
    pub fn get_daily_summary(&self, date: &str) -> Result<DailySummary> {
        self.daily_summary(codec::decode_date(date)?)
    }

    /// Totals for one day. Days with nothing logged report zeros, not gaps;
    /// `latest_weight` is the most recent weigh-in overall.
    ///
    /// Every figure comes from one statement, so the summary reflects a single
    /// snapshot even while other threads are writing.
    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary> {
        let day = codec::encode_date(date);
        let (water_start, water_end) = water::day_window(date, self.store.day_offset());

        let summary = self.store.read(|conn| {
            let summary = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM food_entries WHERE date = ?1),
                    (SELECT SUM(calories * serving_count) FROM food_entries WHERE date = ?1),
                    (SELECT SUM(protein * serving_count) FROM food_entries WHERE date = ?1),
                    (SELECT SUM(carbs * serving_count) FROM food_entries WHERE date = ?1),
                    (SELECT SUM(fat * serving_count) FROM food_entries WHERE date = ?1),
                    (SELECT SUM(calories_burned) FROM exercise_entries WHERE date = ?1),
                    (SELECT SUM(duration) FROM exercise_entries WHERE date = ?1),
                    (SELECT SUM(amount) FROM water_entries
                        WHERE timestamp >= ?2 AND timestamp < ?3),
                    (SELECT COUNT(*) FROM supplement_entries WHERE date = ?1),
                    (SELECT weight FROM weight_entries
                        ORDER BY date DESC, timestamp DESC LIMIT 1)",
                params![day, water_start, water_end],
                |row| {
                    let calories_consumed = row.get::<_, Option<f64>>(1)?.unwrap_or(0.0);
                    let calories_burned = row.get::<_, Option<f64>>(5)?.unwrap_or(0.0);
                    Ok(DailySummary {
                        date: day.clone(),
                        calories_consumed,
                        protein: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        carbs: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                        fat: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                        calories_burned,
                        net_calories: calories_consumed - calories_burned,
                        exercise_minutes: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                        water_total: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                        food_entry_count: count(row.get(0)?),
                        supplement_count: count(row.get(8)?),
                        latest_weight: row.get(9)?,
                    })
                },
            )?;
            Ok(summary)
        })?;
        debug!(date = %summary.date, calories = summary.calories_consumed, "daily summary");
        Ok(summary)
    }

    // --- Maintenance ---

    /// Deletes every record of every family; the schema stays.
    pub fn clear_all_data(&self) -> Result<()> {
        self.store.clear_all()
    }
}

fn count(rows: i64) -> usize {
    usize::try_from(rows).unwrap_or(0)
}
