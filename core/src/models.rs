use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An instant with millisecond precision.
///
/// Constructors truncate sub-millisecond precision so that the integer
/// storage encoding (milliseconds since the Unix epoch) round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let millis_only = dt.nanosecond() / 1_000_000 * 1_000_000;
        Self(dt.with_nanosecond(millis_only).unwrap_or(dt))
    }

    /// `None` when `millis` is outside the representable range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    #[must_use]
    pub fn min_value() -> Self {
        Self::from_datetime(DateTime::<Utc>::MIN_UTC)
    }

    #[must_use]
    pub fn max_value() -> Self {
        Self::from_datetime(DateTime::<Utc>::MAX_UTC)
    }

    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    #[must_use]
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

pub type NutrientMap = BTreeMap<String, f64>;

/// One logged food consumption event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub date: NaiveDate,
    pub timestamp: Timestamp,
    pub meal_type: String,
    pub serving_size: String,
    pub serving_unit: String,
    pub serving_count: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub date: NaiveDate,
    pub timestamp: Timestamp,
    /// Minutes.
    pub duration: i32,
    pub calories_burned: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementEntry {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub date: NaiveDate,
    pub timestamp: Timestamp,
    pub serving_size: String,
    pub serving_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
    #[serde(default)]
    pub nutrients: NutrientMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: Uuid,
    pub weight: f64,
    pub date: NaiveDate,
    pub timestamp: Timestamp,
    pub notes: Option<String>,
}

/// Water intake. The calendar day is derived from `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterEntry {
    pub id: Uuid,
    pub amount: f64,
    pub unit: String,
    pub timestamp: Timestamp,
}

/// User- or import-defined food template, distinct from logged entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFood {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    /// Identifier in the external food database the template was imported from.
    pub external_id: Option<i64>,
    pub is_user_created: bool,
    pub created_date: Timestamp,
    pub serving_size: String,
    pub serving_unit: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub saturated_fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub cholesterol: Option<f64>,
    #[serde(default)]
    pub additional_nutrients: NutrientMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecipe {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub source: Option<String>,
    pub is_user_created: bool,
    pub is_favorite: bool,
    pub created_date: Timestamp,
    /// Minutes.
    pub prep_time: i32,
    /// Minutes.
    pub cook_time: i32,
    pub servings: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecipe {
    pub id: Uuid,
    /// Reference into an external recipe catalogue; not a foreign key.
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: String,
    pub source: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub date_added: Timestamp,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub rating: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: String,
    /// Informational reference to a `CustomRecipe`; not enforced.
    pub recipe_id: Option<Uuid>,
    pub recipe_name: String,
    pub servings: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub id: Uuid,
    pub name: String,
    pub created_date: Timestamp,
    pub is_completed: bool,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Per-date `SUM(value * serving_count)` of the four required macros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub calories_consumed: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub calories_burned: f64,
    pub net_calories: f64,
    pub exercise_minutes: i64,
    pub water_total: f64,
    pub food_entry_count: usize,
    pub supplement_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_weight: Option<f64>,
}
