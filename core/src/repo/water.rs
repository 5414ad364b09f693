use chrono::{FixedOffset, NaiveDate, NaiveTime};
use rusqlite::params;

use super::{Entity, Repository, RowReader, RowWriter};
use crate::error::Result;
use crate::models::WaterEntry;
use crate::schema::{TableSchema, WATER_ENTRIES};

pub type WaterEntryRepository = Repository<WaterEntry>;

const DAY_MILLIS: i64 = 86_400_000;

impl Entity for WaterEntry {
    const TABLE: &'static TableSchema = &WATER_ENTRIES;

    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn write_row(&self, row: &mut RowWriter) -> Result<()> {
        row.id("id", &self.id)
            .real("amount", self.amount)?
            .text("unit", &self.unit)
            .instant("timestamp", self.timestamp);
        Ok(())
    }

    fn read_row(row: &RowReader<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: row.id("id")?,
            amount: row.get("amount")?,
            unit: row.get("unit")?,
            timestamp: row.instant("timestamp")?,
        })
    }
}

/// Half-open `[start, end)` epoch-millisecond window covering `date` as a
/// calendar day at `offset`.
pub(crate) fn day_window(date: NaiveDate, offset: FixedOffset) -> (i64, i64) {
    let local_midnight = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    let start = local_midnight - i64::from(offset.local_minus_utc()) * 1000;
    (start, start + DAY_MILLIS)
}

impl Repository<WaterEntry> {
    /// Entries whose timestamp falls on `date` in the store's day offset,
    /// newest first.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<WaterEntry>> {
        let (start, end) = day_window(date, self.store().day_offset());
        self.query_list(
            "WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp DESC",
            params![start, end],
        )
    }

    pub fn total_for_date(&self, date: NaiveDate) -> Result<Option<f64>> {
        let (start, end) = day_window(date, self.store().day_offset());
        self.scalar(
            "SELECT SUM(amount) FROM water_entries WHERE timestamp >= ?1 AND timestamp < ?2",
            params![start, end],
        )
    }
}
