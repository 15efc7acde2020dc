//! Publish a day to the database, and list published days.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};
use valet_core::VTime;
use valet_db::{Database, DayExtras, records_for};

use super::util::{DaySource, load_for_update};
use crate::Config;

fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(path).with_context(|| format!("failed to open {}", path.display()))
}

/// Stores the day's summary and visits, replacing any earlier publish of it.
pub fn publish<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    leftover: Option<usize>,
    extras: DayExtras,
) -> Result<()> {
    let day = load_for_update(source, config)?;

    if let Some(reported) = leftover {
        let end_of_day = day.time_closed.unwrap_or(VTime::END_OF_DAY);
        let check = day.reconcile_leftovers(end_of_day, reported);
        if let Some(message) = check.discrepancy() {
            warn!(recorded = check.recorded, reported, "leftover mismatch");
            writeln!(writer, "{message}")?;
        }
    }

    let batch = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let (record, visits) = records_for(&day, extras, &batch)?;

    let db_path = config.database_path();
    let mut db = open_database(&db_path)?;
    let saved = db.save_day(&record, &visits)?;
    info!(date = %record.date, visits = saved, batch, "published day");

    writeln!(
        writer,
        "Published {}: {saved} visits to {}",
        record.date,
        db_path.display()
    )?;
    Ok(())
}

/// Lists every published day.
pub fn history<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let db = open_database(&config.database_path())?;
    let days = db.list_days()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&days)?)?;
        return Ok(());
    }
    if days.is_empty() {
        writeln!(writer, "No days published.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<12}{:>8}{:>10}{:>6}{:>6}{:>6}",
        "Date", "Regular", "Oversize", "Total", "Left", "Most"
    )?;
    for day in &days {
        writeln!(
            writer,
            "{:<12}{:>8}{:>10}{:>6}{:>6}{:>6}",
            day.date,
            day.parked_regular,
            day.parked_oversize,
            day.parked_total,
            day.leftover,
            day.max_total
        )?;
    }
    Ok(())
}
