use super::{Entity, Repository, RowReader, RowWriter, flag_filter};
use crate::error::Result;
use crate::models::GroceryList;
use crate::schema::{GROCERY_LISTS, TableSchema};

pub type GroceryListRepository = Repository<GroceryList>;

impl Entity for GroceryList {
    const TABLE: &'static TableSchema = &GROCERY_LISTS;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .instant("created_date", self.created_date)
            .flag("is_completed", self.is_completed)
            .list("items", &self.items);
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.get("name")?,
            created_date: row.instant("created_date")?,
            is_completed: row.flag("is_completed")?,
            items: row.list("items")?,
        })
    }
}

impl Repository<GroceryList> {
    /// Lists not yet completed, newest first.
    pub fn active(&self) -> Result<Vec<GroceryList>> {
        let clause = format!(
            "WHERE {} ORDER BY created_date DESC",
            flag_filter("is_completed", false)
        );
        self.query_list(&clause, [])
    }

    pub fn all(&self) -> Result<Vec<GroceryList>> {
        self.query_list("ORDER BY created_date DESC", [])
    }
}
