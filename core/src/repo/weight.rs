use chrono::NaiveDate;
use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::codec;
use crate::error::Result;
use crate::models::WeightEntry;
use crate::schema::{TableSchema, WEIGHT_ENTRIES};

pub type WeightEntryRepository = Repository<WeightEntry>;

impl Entity for WeightEntry {
    const TABLE: &'static TableSchema = &WEIGHT_ENTRIES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .real("weight", self.weight)?
            .date("date", self.date)
            .instant("timestamp", self.timestamp)
            .opt_text("notes", self.notes.as_deref());
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            weight: row.get("weight")?,
            date: row.date("date")?,
            timestamp: row.instant("timestamp")?,
            notes: row.opt("notes")?,
        })
    }
}

impl Repository<WeightEntry> {
    /// The most recent weigh-in by date; same-day ties go to the later
    /// timestamp.
    pub fn latest(&self) -> Result<Option<WeightEntry>> {
        self.query_one("ORDER BY date DESC, timestamp DESC LIMIT 1", [])
    }

    /// Oldest first, both ends inclusive.
    pub fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        self.query_list(
            "WHERE date BETWEEN ?1 AND ?2 ORDER BY date ASC, timestamp ASC",
            params![codec::encode_date(start), codec::encode_date(end)],
        )
    }

    /// The last `limit` weigh-ins, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<WeightEntry>> {
        self.query_list(
            "ORDER BY date DESC, timestamp DESC LIMIT ?1",
            params![limit],
        )
    }

    pub fn entry_on_date(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        self.query_one(
            "WHERE date = ?1 ORDER BY timestamp DESC LIMIT 1",
            params![codec::encode_date(date)],
        )
    }
}
