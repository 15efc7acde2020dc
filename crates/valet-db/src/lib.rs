//! Storage layer for the bike valet tracker.
//!
//! Keeps one summary row per day and one row per visit using `rusqlite`,
//! for reporting across many days. The day's datafile stays the working
//! copy; a day is (re)published here whenever its numbers are final.
//!
//! # Schema
//!
//! Dates are stored as `YYYY-MM-DD` text and times of day as `HH:MM` text,
//! so lexicographic ordering matches chronological ordering. A visit's id is
//! `<date>.<tag>`, which is unique because a tag is used at most once a day.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use valet_core::{BikeType, Category, TrackerDay, VTime};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Only a dated day can be stored.
    #[error("day has no date")]
    MissingDate,
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

/// Day-end values reported by the operator rather than recorded as events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayExtras {
    pub precipitation: Option<f64>,
    pub temperature: Option<f64>,
}

/// One day's summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: String,
    pub parked_regular: i64,
    pub parked_oversize: i64,
    pub parked_total: i64,
    pub leftover: i64,
    pub max_regular: i64,
    pub max_regular_time: Option<String>,
    pub max_oversize: i64,
    pub max_oversize_time: Option<String>,
    pub max_total: i64,
    pub max_total_time: Option<String>,
    pub time_open: Option<String>,
    pub time_closed: Option<String>,
    /// 0 = Monday through 6 = Sunday.
    pub weekday: i64,
    pub precipitation: Option<f64>,
    pub temperature: Option<f64>,
    pub registrations: i64,
    pub notes: String,
}

/// One visit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub id: String,
    pub date: String,
    pub tag: String,
    pub bike_type: String,
    pub time_in: String,
    pub time_out: Option<String>,
    /// Minutes; open visits are measured as at close of business.
    pub duration: Option<i64>,
    pub leftover: bool,
    pub batch: String,
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Builds the rows to store for a day.
///
/// Open visits are measured to closing time (or the day's last event if
/// there are no hours), with the usual close-of-business minimum.
pub fn records_for(
    day: &TrackerDay,
    extras: DayExtras,
    batch: &str,
) -> Result<(DayRecord, Vec<VisitRecord>), DbError> {
    let date: NaiveDate = day.date.ok_or(DbError::MissingDate)?;
    let date_str = date.format("%Y-%m-%d").to_string();
    let end_of_day = day
        .time_closed
        .or_else(|| day.latest_event(VTime::END_OF_DAY))
        .unwrap_or(VTime::END_OF_DAY);

    let totals = day.day_totals(Some(VTime::END_OF_DAY));
    let mark = |category: Category| {
        totals
            .fullest
            .iter()
            .find(|m| m.category == category)
            .map(|m| (count(m.count), m.at.map(|t| t.to_string())))
            .unwrap_or_default()
    };
    let (max_regular, max_regular_time) = mark(Category::Regular);
    let (max_oversize, max_oversize_time) = mark(Category::Oversize);
    let (max_total, max_total_time) = mark(Category::Total);

    let record = DayRecord {
        date: date_str.clone(),
        parked_regular: count(totals.parked.regular),
        parked_oversize: count(totals.parked.oversize),
        parked_total: count(totals.parked.total),
        leftover: count(totals.leftover.total),
        max_regular,
        max_regular_time,
        max_oversize,
        max_oversize_time,
        max_total,
        max_total_time,
        time_open: day.time_open.map(|t| t.to_string()),
        time_closed: day.time_closed.map(|t| t.to_string()),
        weekday: i64::from(date.weekday().num_days_from_monday()),
        precipitation: extras.precipitation,
        temperature: extras.temperature,
        registrations: i64::from(day.registrations),
        notes: day.notes.join("\n"),
    };

    let visits = day
        .biketags()
        .filter_map(|biketag| {
            let visit = biketag.visit()?;
            let bike_type = match biketag.bike_type() {
                BikeType::Oversize => BikeType::Oversize,
                _ => BikeType::Regular,
            };
            Some(VisitRecord {
                id: format!("{date_str}.{}", biketag.tag()),
                date: date_str.clone(),
                tag: biketag.tag().to_string(),
                bike_type: bike_type.as_str().to_string(),
                time_in: visit.time_in.to_string(),
                time_out: visit.time_out.map(|t| t.to_string()),
                duration: visit.duration(end_of_day, true).map(i64::from),
                leftover: visit.is_open(),
                batch: batch.to_string(),
            })
        })
        .collect();

    Ok((record, visits))
}

fn day_from_row(row: &Row<'_>) -> rusqlite::Result<DayRecord> {
    Ok(DayRecord {
        date: row.get(0)?,
        parked_regular: row.get(1)?,
        parked_oversize: row.get(2)?,
        parked_total: row.get(3)?,
        leftover: row.get(4)?,
        max_regular: row.get(5)?,
        max_regular_time: row.get(6)?,
        max_oversize: row.get(7)?,
        max_oversize_time: row.get(8)?,
        max_total: row.get(9)?,
        max_total_time: row.get(10)?,
        time_open: row.get(11)?,
        time_closed: row.get(12)?,
        weekday: row.get(13)?,
        precipitation: row.get(14)?,
        temperature: row.get(15)?,
        registrations: row.get(16)?,
        notes: row.get(17)?,
    })
}

const DAY_COLUMNS: &str = "
    date, parked_regular, parked_oversize, parked_total, leftover,
    max_regular, max_regular_time, max_oversize, max_oversize_time,
    max_total, max_total_time, time_open, time_closed, weekday,
    precipitation, temperature, registrations, notes";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS day (
                date TEXT PRIMARY KEY,
                parked_regular INTEGER NOT NULL,
                parked_oversize INTEGER NOT NULL,
                parked_total INTEGER NOT NULL,
                leftover INTEGER NOT NULL,
                max_regular INTEGER NOT NULL,
                max_regular_time TEXT,
                max_oversize INTEGER NOT NULL,
                max_oversize_time TEXT,
                max_total INTEGER NOT NULL,
                max_total_time TEXT,
                time_open TEXT,
                time_closed TEXT,
                weekday INTEGER NOT NULL,
                precipitation REAL,
                temperature REAL,
                registrations INTEGER NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT ''
            );

            -- One row per visit; id is '<date>.<tag>'
            CREATE TABLE IF NOT EXISTS visit (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                tag TEXT NOT NULL,
                bike_type TEXT NOT NULL,
                time_in TEXT NOT NULL,
                time_out TEXT,
                duration INTEGER,
                leftover INTEGER NOT NULL,
                batch TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_visit_date ON visit(date);
            ",
        )?;
        Ok(())
    }

    /// Replaces everything stored for the record's date. Returns visits written.
    pub fn save_day(&mut self, day: &DayRecord, visits: &[VisitRecord]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM visit WHERE date = ?", [&day.date])?;
        tx.execute("DELETE FROM day WHERE date = ?", [&day.date])?;
        tx.execute(
            &format!(
                "INSERT INTO day ({DAY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                day.date,
                day.parked_regular,
                day.parked_oversize,
                day.parked_total,
                day.leftover,
                day.max_regular,
                day.max_regular_time,
                day.max_oversize,
                day.max_oversize_time,
                day.max_total,
                day.max_total_time,
                day.time_open,
                day.time_closed,
                day.weekday,
                day.precipitation,
                day.temperature,
                day.registrations,
                day.notes,
            ],
        )?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO visit
                (id, date, tag, bike_type, time_in, time_out, duration, leftover, batch)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for visit in visits {
                inserted += stmt.execute(params![
                    visit.id,
                    visit.date,
                    visit.tag,
                    visit.bike_type,
                    visit.time_in,
                    visit.time_out,
                    visit.duration,
                    visit.leftover,
                    visit.batch,
                ])?;
            }
        }
        tx.commit()?;
        info!(date = %day.date, visits = inserted, "saved day");
        Ok(inserted)
    }

    /// The summary row for one date, if stored.
    pub fn day_summary(&self, date: &str) -> Result<Option<DayRecord>, DbError> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {DAY_COLUMNS} FROM day WHERE date = ?"),
                [date],
                day_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All stored days, oldest first.
    pub fn list_days(&self) -> Result<Vec<DayRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DAY_COLUMNS} FROM day ORDER BY date ASC"))?;
        let rows = stmt.query_map([], day_from_row)?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Visits stored for one date, by check-in time then tag.
    pub fn visits_for(&self, date: &str) -> Result<Vec<VisitRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, tag, bike_type, time_in, time_out, duration, leftover, batch
            FROM visit
            WHERE date = ?
            ORDER BY time_in ASC, tag ASC
            ",
        )?;
        let rows = stmt.query_map([date], |row| {
            Ok(VisitRecord {
                id: row.get(0)?,
                date: row.get(1)?,
                tag: row.get(2)?,
                bike_type: row.get(3)?,
                time_in: row.get(4)?,
                time_out: row.get(5)?,
                duration: row.get(6)?,
                leftover: row.get(7)?,
                batch: row.get(8)?,
            })
        })?;
        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?);
        }
        Ok(visits)
    }
}
