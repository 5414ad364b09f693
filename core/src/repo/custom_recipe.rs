use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter, flag_filter, like_pattern};
use crate::error::Result;
use crate::models::CustomRecipe;
use crate::schema::{CUSTOM_RECIPES, TableSchema};

pub type CustomRecipeRepository = Repository<CustomRecipe>;

impl Entity for CustomRecipe {
    const TABLE: &'static TableSchema = &CUSTOM_RECIPES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .text("category", &self.category)
            .opt_text("source", self.source.as_deref())
            .flag("is_user_created", self.is_user_created)
            .flag("is_favorite", self.is_favorite)
            .instant("created_date", self.created_date)
            .int("prep_time", self.prep_time)
            .int("cook_time", self.cook_time)
            .int("servings", self.servings)
            .blob("image_data", self.image_data.as_deref())
            .list("ingredients", &self.ingredients)
            .list("instructions", &self.instructions)
            .list("tags", &self.tags)
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
            category: row.get("category")?,
            source: row.opt("source")?,
            is_user_created: row.flag("is_user_created")?,
            is_favorite: row.flag("is_favorite")?,
            created_date: row.instant("created_date")?,
            prep_time: row.get("prep_time")?,
            cook_time: row.get("cook_time")?,
            servings: row.get("servings")?,
            image_data: row.blob("image_data")?,
            ingredients: row.list("ingredients")?,
            instructions: row.list("instructions")?,
            tags: row.list("tags")?,
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

impl Repository<CustomRecipe> {
    pub fn all(&self) -> Result<Vec<CustomRecipe>> {
        self.query_list("ORDER BY name", [])
    }

    pub fn favorites(&self) -> Result<Vec<CustomRecipe>> {
        let clause = format!("WHERE {} ORDER BY name", flag_filter("is_favorite", true));
        self.query_list(&clause, [])
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<CustomRecipe>> {
        self.query_list("WHERE category = ?1 ORDER BY name", params![category])
    }

    /// Recipes whose name contains `query`, alphabetically.
    pub fn search(&self, query: &str) -> Result<Vec<CustomRecipe>> {
        self.query_list(
            "WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name",
            params![like_pattern(query)],
        )
    }
}
