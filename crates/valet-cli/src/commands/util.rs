//! Shared helpers for commands that work on a day's datafile.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use valet_core::{DayConfig, TagId, Tally, TrackerDay, VTime, datafile};

use crate::Config;

/// The datafile a command works on, and the day it should hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySource {
    pub path: PathBuf,
    /// Date for a fresh day; a loaded file's own date wins.
    pub date: NaiveDate,
}

impl DaySource {
    /// `--file` if given, else `<data_dir>/<prefix><date>.dat` for `--date` or today.
    pub fn resolve(config: &Config, date: Option<NaiveDate>, file: Option<&Path>) -> Self {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let path = file.map_or_else(
            || {
                config.data_dir.join(format!(
                    "{}{}.dat",
                    config.datafile_prefix,
                    date.format("%Y-%m-%d")
                ))
            },
            Path::to_path_buf,
        );
        Self { path, date }
    }
}

/// A fresh day from the configured tag lists and hours.
pub fn new_day(config: &Config, date: NaiveDate) -> Result<TrackerDay> {
    let lists = config.tag_lists()?.unwrap_or_default();
    let (time_open, time_closed) = config.hours()?;
    Ok(TrackerDay::new(DayConfig {
        date: Some(date),
        time_open,
        time_closed,
        registrations: 0,
        regular: lists.regular,
        oversize: lists.oversize,
        retired: lists.retired,
    }))
}

/// Reads and parses a datafile, then harmonizes its tag lists with its visits.
///
/// The datafile's own tag lists are used; `valet init` refreshes them from
/// configuration.
pub fn load(source: &DaySource) -> Result<TrackerDay> {
    let text = std::fs::read_to_string(&source.path)
        .with_context(|| format!("failed to read {}", source.path.display()))?;
    let mut day = datafile::parse(&text, &source.path.display().to_string())?;
    let fixes = day.harmonize();
    debug!(path = %source.path.display(), fixes = fixes.len(), "loaded day");
    Ok(day)
}

/// Loads the datafile if it exists, else starts a fresh day.
pub fn load_or_new(source: &DaySource, config: &Config) -> Result<TrackerDay> {
    if source.path.exists() {
        load(source)
    } else {
        debug!(path = %source.path.display(), "no datafile yet, starting a new day");
        new_day(config, source.date)
    }
}

/// Refuses to go on with a day that fails lint.
pub fn ensure_consistent(day: &TrackerDay) -> Result<()> {
    let errors = day.lint(false);
    if errors.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "datafile is inconsistent, correct it before continuing:\n{}",
        errors.join("\n")
    );
}

/// Loads the day for a state-changing command.
pub fn load_for_update(source: &DaySource, config: &Config) -> Result<TrackerDay> {
    let day = load_or_new(source, config)?;
    ensure_consistent(&day)?;
    Ok(day)
}

/// Writes the day to a temporary file beside `path`, then renames it into place.
pub fn save(path: &Path, day: &TrackerDay) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).context("failed to create data directory")?;

    let mut temp = NamedTempFile::new_in(dir).context("failed to create temporary datafile")?;
    temp.write_all(datafile::render(day).as_bytes())
        .context("failed to write datafile")?;
    temp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    info!(path = %path.display(), "saved datafile");
    Ok(())
}

pub fn parse_tag(raw: &str) -> Result<TagId> {
    Ok(TagId::new(raw)?)
}

pub fn parse_time(raw: &str) -> Result<VTime> {
    Ok(VTime::parse(raw)?)
}

/// The time reports are made as of.
///
/// Defaults to now for today (or later), and to closing time for past days.
pub fn report_time(raw: Option<&str>, day: &TrackerDay) -> Result<VTime> {
    if let Some(raw) = raw {
        return parse_time(raw);
    }
    let today = Local::now().date_naive();
    Ok(match day.date {
        Some(date) if date < today => day.time_closed.unwrap_or(VTime::END_OF_DAY),
        _ => VTime::now(),
    })
}

/// A tag for display, in the configured case.
pub fn show(tag: &TagId, config: &Config) -> String {
    tag.cased(config.uppercase_tags)
}

/// One labelled line of regular, oversize and total counts.
pub fn tally_line(label: &str, tally: Tally) -> String {
    format!(
        "{label:<20}{:>3} regular {:>3} oversize {:>3} total",
        tally.regular, tally.oversize, tally.total
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A config with a small tag set and a data dir under `dir`.
    pub fn config_in(dir: &Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            regular_tags: "wa1 wa2 wa3 wa4 wa5 wb1 wb2 wb3".to_string(),
            oversize_tags: "bf1 bf2".to_string(),
            retired_tags: "wb3".to_string(),
            time_open: Some("07:00".to_string()),
            time_closed: Some("18:00".to_string()),
            ..Config::default()
        }
    }

    pub fn source_in(config: &Config) -> DaySource {
        DaySource::resolve(config, NaiveDate::from_ymd_opt(2024, 6, 1), None)
    }

    /// Records `(tag, in, out)` visits through the check-in and check-out commands.
    pub fn record_visits(
        config: &Config,
        source: &DaySource,
        visits: &[(&str, &str, Option<&str>)],
    ) {
        for (tag, time_in, time_out) in visits {
            crate::commands::track::check_in(&mut Vec::new(), source, config, tag, time_in)
                .unwrap();
            if let Some(time_out) = time_out {
                crate::commands::track::check_out(&mut Vec::new(), source, config, tag, time_out)
                    .unwrap();
            }
        }
    }

    pub fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }
}
