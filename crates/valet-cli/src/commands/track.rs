//! Check-in, check-out, edit and delete.

use std::io::Write;

use anyhow::Result;
use valet_core::{DeleteWhat, InOut, TrackerDay, VTime};

use super::util::{DaySource, load_for_update, parse_tag, parse_time, save, show};
use crate::Config;

/// Loads the day, applies `change`, and saves only if it succeeded.
fn update<F>(source: &DaySource, config: &Config, change: F) -> Result<TrackerDay>
where
    F: FnOnce(&mut TrackerDay) -> Result<()>,
{
    let mut day = load_for_update(source, config)?;
    change(&mut day)?;
    save(&source.path, &day)?;
    Ok(day)
}

fn warn_if_unusual<W: Write>(writer: &mut W, day: &TrackerDay, time: VTime) -> Result<()> {
    if !day.bike_time_reasonable(time) {
        writeln!(writer, "Note: {time} is well outside today's hours.")?;
    }
    Ok(())
}

pub fn check_in<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
    time: &str,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let time = parse_time(time)?;
    let day = update(source, config, |day| Ok(day.check_in(&tag, time)?))?;
    writeln!(writer, "{} checked in at {time}", show(&tag, config))?;
    warn_if_unusual(writer, &day, time)
}

pub fn check_out<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
    time: &str,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let time = parse_time(time)?;
    let day = update(source, config, |day| Ok(day.check_out(&tag, time)?))?;
    writeln!(writer, "{} checked out at {time}", show(&tag, config))?;
    warn_if_unusual(writer, &day, time)
}

pub fn edit<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
    which: InOut,
    time: &str,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    let time = parse_time(time)?;
    update(source, config, |day| Ok(day.edit(&tag, which, time)?))?;
    let event = match which {
        InOut::In => "check-in",
        InOut::Out => "check-out",
    };
    writeln!(writer, "{} {event} changed to {time}", show(&tag, config))?;
    Ok(())
}

pub fn delete<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    tag: &str,
    what: DeleteWhat,
) -> Result<()> {
    let tag = parse_tag(tag)?;
    update(source, config, |day| Ok(day.delete(&tag, what)?))?;
    let message = match what {
        DeleteWhat::Both => "visit deleted",
        DeleteWhat::Out => "check-out deleted",
    };
    writeln!(writer, "{} {message}", show(&tag, config))?;
    Ok(())
}
