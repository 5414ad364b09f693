//! The authoritative table layout. Table DDL is generated from these
//! definitions and the schema guard validates existing stores against them,
//! so repositories, DDL and validation cannot disagree.

use std::fmt;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// Bump whenever any table, column or index below changes.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_MARKER_TABLE: &str = "schema_marker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
}

impl ColumnType {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// SQL literal exactly as written in the DDL (and as reported back by
    /// `PRAGMA table_info`).
    pub default: Option<&'static str>,
    pub primary_key: bool,
}

impl Column {
    const fn with_default(self, literal: &'static str) -> Self {
        Self {
            default: Some(literal),
            ..self
        }
    }

    fn ddl(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.ty.sql());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if let Some(default) = self.default {
            let _ = write!(sql, " DEFAULT {default}");
        }
        sql
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ddl())
    }
}

const fn id() -> Column {
    Column {
        name: "id",
        ty: ColumnType::Text,
        nullable: false,
        default: None,
        primary_key: true,
    }
}

const fn required(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        nullable: false,
        default: None,
        primary_key: false,
    }
}

const fn optional(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        nullable: true,
        default: None,
        primary_key: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [Index],
}

impl TableSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> &'static str {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map_or("id", |c| c.name)
    }

    #[must_use]
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::ddl).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }

    #[must_use]
    pub fn create_index_sql(&self) -> Vec<String> {
        self.indices
            .iter()
            .map(|idx| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                    idx.name,
                    self.name,
                    idx.columns.join(", ")
                )
            })
            .collect()
    }
}

use ColumnType::{Blob, Integer, Real, Text};

pub const FOOD_ENTRIES: TableSchema = TableSchema {
    name: "food_entries",
    columns: &[
        id(),
        required("name", Text),
        optional("brand", Text),
        optional("barcode", Text),
        required("date", Text),
        required("timestamp", Integer),
        required("meal_type", Text),
        required("serving_size", Text),
        required("serving_unit", Text),
        required("serving_count", Real).with_default("1.0"),
        required("calories", Real),
        required("protein", Real),
        required("carbs", Real),
        required("fat", Real),
        optional("fiber", Real),
        optional("sugar", Real),
        optional("sodium", Real),
    ],
    indices: &[Index {
        name: "idx_food_entries_date",
        columns: &["date", "meal_type"],
    }],
};

pub const EXERCISE_ENTRIES: TableSchema = TableSchema {
    name: "exercise_entries",
    columns: &[
        id(),
        required("name", Text),
        required("category", Text),
        required("type", Text),
        required("date", Text),
        required("timestamp", Integer),
        required("duration", Integer),
        required("calories_burned", Real),
        optional("notes", Text),
    ],
    indices: &[Index {
        name: "idx_exercise_entries_date",
        columns: &["date"],
    }],
};

pub const SUPPLEMENT_ENTRIES: TableSchema = TableSchema {
    name: "supplement_entries",
    columns: &[
        id(),
        required("name", Text),
        optional("brand", Text),
        required("date", Text),
        required("timestamp", Integer),
        required("serving_size", Text),
        required("serving_unit", Text),
        optional("image_data", Blob),
        required("nutrients", Text).with_default("'{}'"),
    ],
    indices: &[Index {
        name: "idx_supplement_entries_date",
        columns: &["date"],
    }],
};

pub const WEIGHT_ENTRIES: TableSchema = TableSchema {
    name: "weight_entries",
    columns: &[
        id(),
        required("weight", Real),
        required("date", Text),
        required("timestamp", Integer),
        optional("notes", Text),
    ],
    indices: &[Index {
        name: "idx_weight_entries_date",
        columns: &["date"],
    }],
};

pub const WATER_ENTRIES: TableSchema = TableSchema {
    name: "water_entries",
    columns: &[
        id(),
        required("amount", Real).with_default("8.0"),
        required("unit", Text).with_default("'oz'"),
        required("timestamp", Integer),
    ],
    indices: &[Index {
        name: "idx_water_entries_timestamp",
        columns: &["timestamp"],
    }],
};

pub const CUSTOM_FOODS: TableSchema = TableSchema {
    name: "custom_foods",
    columns: &[
        id(),
        required("name", Text),
        optional("brand", Text),
        optional("barcode", Text),
        optional("category", Text),
        optional("source", Text),
        optional("external_id", Integer),
        required("is_user_created", Integer).with_default("1"),
        required("created_date", Integer),
        required("serving_size", Text),
        required("serving_unit", Text),
        required("calories", Real),
        required("protein", Real),
        required("carbs", Real),
        required("fat", Real),
        optional("saturated_fat", Real),
        optional("fiber", Real),
        optional("sugar", Real),
        optional("sodium", Real),
        optional("cholesterol", Real),
        required("additional_nutrients", Text).with_default("'{}'"),
    ],
    indices: &[
        Index {
            name: "idx_custom_foods_barcode",
            columns: &["barcode"],
        },
        Index {
            name: "idx_custom_foods_name",
            columns: &["name"],
        },
        Index {
            name: "idx_custom_foods_external_id",
            columns: &["external_id"],
        },
    ],
};

pub const CUSTOM_RECIPES: TableSchema = TableSchema {
    name: "custom_recipes",
    columns: &[
        id(),
        required("name", Text),
        required("category", Text),
        optional("source", Text),
        required("is_user_created", Integer).with_default("1"),
        required("is_favorite", Integer).with_default("0"),
        required("created_date", Integer),
        required("prep_time", Integer),
        required("cook_time", Integer),
        required("servings", Integer),
        optional("image_data", Blob),
        required("ingredients", Text).with_default("'[]'"),
        required("instructions", Text).with_default("'[]'"),
        required("tags", Text).with_default("'[]'"),
        required("calories", Real),
        required("protein", Real),
        required("carbs", Real),
        required("fat", Real),
        optional("fiber", Real),
        optional("sugar", Real),
        optional("sodium", Real),
    ],
    indices: &[
        Index {
            name: "idx_custom_recipes_name",
            columns: &["name"],
        },
        Index {
            name: "idx_custom_recipes_category",
            columns: &["category"],
        },
    ],
};

pub const FAVORITE_RECIPES: TableSchema = TableSchema {
    name: "favorite_recipes",
    columns: &[
        id(),
        required("recipe_id", Text),
        required("recipe_name", Text),
        required("category", Text),
        optional("source", Text),
        optional("image_url", Text),
        required("date_added", Integer),
        required("prep_time", Integer),
        required("cook_time", Integer),
        required("servings", Integer),
        required("rating", Integer).with_default("0"),
    ],
    indices: &[Index {
        name: "idx_favorite_recipes_recipe_id",
        columns: &["recipe_id"],
    }],
};

pub const MEAL_PLANS: TableSchema = TableSchema {
    name: "meal_plans",
    columns: &[
        id(),
        required("date", Text),
        required("meal_type", Text),
        optional("recipe_id", Text),
        required("recipe_name", Text),
        required("servings", Integer).with_default("1"),
        optional("notes", Text),
    ],
    indices: &[Index {
        name: "idx_meal_plans_date",
        columns: &["date", "meal_type"],
    }],
};

pub const GROCERY_LISTS: TableSchema = TableSchema {
    name: "grocery_lists",
    columns: &[
        id(),
        required("name", Text),
        required("created_date", Integer),
        required("is_completed", Integer).with_default("0"),
        required("items", Text).with_default("'[]'"),
    ],
    indices: &[Index {
        name: "idx_grocery_lists_created_date",
        columns: &["created_date"],
    }],
};

/// Every entity table, in creation order.
pub const TABLES: &[TableSchema] = &[
    FOOD_ENTRIES,
    EXERCISE_ENTRIES,
    SUPPLEMENT_ENTRIES,
    WEIGHT_ENTRIES,
    WATER_ENTRIES,
    CUSTOM_FOODS,
    CUSTOM_RECIPES,
    FAVORITE_RECIPES,
    MEAL_PLANS,
    GROCERY_LISTS,
];

#[must_use]
pub fn table(name: &str) -> Option<&'static TableSchema> {
    TABLES.iter().find(|t| t.name == name)
}

/// SHA-256 over the generated DDL of every table and index, hex encoded.
#[must_use]
pub fn fingerprint() -> String {
    let mut hasher = Sha256::new();
    for table in TABLES {
        hasher.update(table.create_table_sql().as_bytes());
        hasher.update(b";\n");
        for sql in table.create_index_sql() {
            hasher.update(sql.as_bytes());
            hasher.update(b";\n");
        }
    }
    hex::encode(hasher.finalize())
}
