//! Day settings: registration count and operating hours.

use std::io::Write;

use anyhow::Result;
use valet_core::{RegistrationChange, TrackerDay};

use super::util::{DaySource, load_for_update, parse_time, save};
use crate::Config;

fn registration_count(count: u32) -> String {
    match count {
        1 => "There is 1 registration".to_string(),
        n => format!("There are {n} registrations"),
    }
}

/// Shows the registration count, or changes it by `+N`, `-N` or to `N`.
pub fn registrations<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    change: Option<&str>,
) -> Result<()> {
    let mut day = load_for_update(source, config)?;
    if let Some(raw) = change {
        let change: RegistrationChange = raw.parse()?;
        let before = day.registrations;
        if day.change_registrations(change)? != before {
            save(&source.path, &day)?;
        }
    }
    writeln!(writer, "{}", registration_count(day.registrations))?;
    Ok(())
}

fn hours_line(day: &TrackerDay) -> String {
    match (day.time_open, day.time_closed) {
        (Some(open), Some(closed)) => format!("{open} - {closed}"),
        (Some(open), None) => format!("{open} - (not set)"),
        (None, Some(closed)) => format!("(not set) - {closed}"),
        (None, None) => "not set".to_string(),
    }
}

/// Shows today's operating hours, or sets them from `(open, closed)`.
pub fn hours<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    times: Option<(&str, &str)>,
) -> Result<()> {
    let mut day = load_for_update(source, config)?;
    let Some((open, closed)) = times else {
        writeln!(writer, "Hours: {}", hours_line(&day))?;
        return Ok(());
    };

    if day.set_hours(parse_time(open)?, parse_time(closed)?)? {
        save(&source.path, &day)?;
        writeln!(writer, "Hours set to {}", hours_line(&day))?;
    } else {
        writeln!(writer, "Hours already {}", hours_line(&day))?;
    }

    let outside = day
        .all_visits()
        .into_iter()
        .flat_map(|visit| std::iter::once(visit.time_in).chain(visit.time_out))
        .filter(|time| !day.bike_time_reasonable(*time))
        .count();
    if outside > 0 {
        writeln!(writer, "Note: {outside} check-ins/outs are well outside these hours.")?;
    }
    Ok(())
}
