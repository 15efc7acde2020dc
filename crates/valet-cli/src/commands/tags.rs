//! Tag lookups and retirement.

use std::io::Write;

use anyhow::Result;
use valet_core::{TagQuery, format_minutes};

use super::util::{DaySource, load_for_update, parse_tag, report_time, save, show};
use crate::Config;

pub fn query<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tags: &[String],
    as_of: Option<&str>,
) -> Result<()> {
    let day = load_for_update(source, config)?;
    let as_of = report_time(as_of, &day)?;

    for raw in tags {
        let tag = parse_tag(raw)?;
        let name = show(&tag, config);
        match day.query(&tag, as_of) {
            TagQuery::CheckedIn { time_in } => {
                writeln!(writer, "{name}: in at {time_in}, still here")?;
            }
            TagQuery::CheckedOut { time_in, time_out } => {
                let stay = format_minutes(i64::from(time_out.since(time_in)));
                writeln!(writer, "{name}: in at {time_in}, out at {time_out} ({stay})")?;
            }
            TagQuery::Retired => writeln!(writer, "{name}: retired")?,
            TagQuery::NotFound if day.biketag(&tag).is_some() => {
                writeln!(writer, "{name}: not used as of {as_of}")?;
            }
            TagQuery::NotFound => writeln!(writer, "{name}: not one of today's tags")?,
        }
    }
    Ok(())
}

pub fn retire<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let mut day = load_for_update(source, config)?;
    if day.retire_tag(&tag)? {
        save(&source.path, &day)?;
        writeln!(writer, "{} retired", show(&tag, config))?;
    } else {
        writeln!(writer, "{} was already retired", show(&tag, config))?;
    }
    Ok(())
}

pub fn unretire<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let mut day = load_for_update(source, config)?;
    if day.unretire_tag(&tag)? {
        save(&source.path, &day)?;
        writeln!(writer, "{} back in service", show(&tag, config))?;
    } else {
        writeln!(writer, "{} was not retired", show(&tag, config))?;
    }
    Ok(())
}
