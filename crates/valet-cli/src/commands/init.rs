//! Init command: start a day's datafile, or refresh its tag lists.

use std::io::Write;

use anyhow::Result;

use super::util::{DaySource, ensure_consistent, load, new_day, save};
use crate::Config;

/// Creates the datafile from configuration.
///
/// If it already exists, its tag lists are replaced by the configured ones
/// and reconciled with the visits already recorded.
pub fn run<W: Write>(writer: &mut W, source: &DaySource, config: &Config) -> Result<()> {
    let path = source.path.display();

    if !source.path.exists() {
        let day = new_day(config, source.date)?;
        save(&source.path, &day)?;
        writeln!(writer, "Started {path}")?;
        writeln!(writer, "{} tags available", day.usable_tags().len())?;
        if day.usable_tags().is_empty() {
            writeln!(writer, "No tags configured; set regular_tags and oversize_tags.")?;
        }
        return Ok(());
    }

    let Some(lists) = config.tag_lists()? else {
        writeln!(writer, "No tag lists configured; {path} left as it was.")?;
        return Ok(());
    };
    let mut day = load(source)?;
    day.set_tag_lists(lists.regular, lists.oversize, lists.retired);
    let fixes = day.harmonize();
    ensure_consistent(&day)?;
    save(&source.path, &day)?;

    writeln!(writer, "Updated tag lists in {path}")?;
    for fix in fixes {
        writeln!(writer, "  {fix}")?;
    }
    Ok(())
}
