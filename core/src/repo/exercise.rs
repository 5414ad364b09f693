use chrono::NaiveDate;
use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::codec;
use crate::error::Result;
use crate::models::ExerciseEntry;
use crate::schema::{EXERCISE_ENTRIES, TableSchema};

pub type ExerciseEntryRepository = Repository<ExerciseEntry>;

impl Entity for ExerciseEntry {
    const TABLE: &'static TableSchema = &EXERCISE_ENTRIES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .text("name", &self.name)
            .text("category", &self.category)
            .text("type", &self.exercise_type)
            .date("date", self.date)
            .instant("timestamp", self.timestamp)
            .int("duration", self.duration)
            .real("calories_burned", self.calories_burned)?
            .opt_text("notes", self.notes.as_deref());
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            exercise_type: row.get("type")?,
            date: row.date("date")?,
            timestamp: row.instant("timestamp")?,
            duration: row.get("duration")?,
            calories_burned: row.get("calories_burned")?,
            notes: row.opt("notes")?,
        })
    }
}

impl Repository<ExerciseEntry> {
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<ExerciseEntry>> {
        self.query_list(
            "WHERE date = ?1 ORDER BY timestamp DESC",
            params![codec::encode_date(date)],
        )
    }

    /// Both ends inclusive.
    pub fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ExerciseEntry>> {
        self.query_list(
            "WHERE date BETWEEN ?1 AND ?2 ORDER BY timestamp DESC",
            params![codec::encode_date(start), codec::encode_date(end)],
        )
    }

    pub fn total_calories_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        self.scalar(
            "SELECT SUM(calories_burned) FROM exercise_entries WHERE date = ?1",
            params![codec::encode_date(date)],
        )
    }

    /// Minutes.
    pub fn total_duration_for_date(&self, date: NaiveDate) -> Result<Option<i64>> {
        self.scalar(
            "SELECT SUM(duration) FROM exercise_entries WHERE date = ?1",
            params![codec::encode_date(date)],
        )
    }
}
