use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::error::Result;
use crate::models::FavoriteRecipe;
use crate::schema::{FAVORITE_RECIPES, TableSchema};

pub type FavoriteRecipeRepository = Repository<FavoriteRecipe>;

impl Entity for FavoriteRecipe {
    const TABLE: &'static TableSchema = &FAVORITE_RECIPES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("recipe_id", &self.recipe_id)
            .text("recipe_name", &self.recipe_name)
            .text("category", &self.category)
            .opt_text("source", self.source.as_deref())
            .opt_text("image_url", self.image_url.as_deref())
            .instant("date_added", self.date_added)
            .int("prep_time", self.prep_time)
            .int("cook_time", self.cook_time)
            .int("servings", self.servings)
            .int("rating", self.rating);
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            recipe_id: row.get("recipe_id")?,
            recipe_name: row.get("recipe_name")?,
            category: row.get("category")?,
            source: row.opt("source")?,
            image_url: row.opt("image_url")?,
            date_added: row.instant("date_added")?,
            prep_time: row.get("prep_time")?,
            cook_time: row.get("cook_time")?,
            servings: row.get("servings")?,
            rating: row.get("rating")?,
        })
    }
}

impl Repository<FavoriteRecipe> {
    /// Most recently added first.
    pub fn all(&self) -> Result<Vec<FavoriteRecipe>> {
        self.query_list("ORDER BY date_added DESC", [])
    }

    pub fn by_recipe_id(&self, recipe_id: &str) -> Result<Option<FavoriteRecipe>> {
        self.query_one("WHERE recipe_id = ?1 LIMIT 1", params![recipe_id])
    }
}
