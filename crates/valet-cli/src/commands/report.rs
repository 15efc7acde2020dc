//! Day summary, block and moment reports.

use std::io::Write;

use anyhow::Result;
use valet_core::audit::{busiest, highwater};
use valet_core::stats::{stay_categories, stay_stats};
use valet_core::{TagId, VTime, format_minutes};

use super::util::{DaySource, load_for_update, report_time, show, tally_line};
use crate::Config;

#[expect(
    clippy::cast_possible_truncation,
    reason = "mean and median of u16 minutes fit in i64"
)]
fn minutes(value: f64) -> String {
    format_minutes(value.round() as i64)
}

fn tag_names(tags: &[TagId], config: &Config) -> String {
    tags.iter()
        .map(|t| show(t, config))
        .collect::<Vec<_>>()
        .join(", ")
}

fn times(starts: &[VTime]) -> String {
    starts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The end-of-day summary: totals, fullest times, stay lengths, busiest times.
pub fn report<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    as_of: Option<&str>,
) -> Result<()> {
    let day = load_for_update(source, config)?;
    let as_of = report_time(as_of, &day)?;

    match day.date {
        Some(date) => writeln!(writer, "Summary for {date} as at {as_of}")?,
        None => writeln!(writer, "Summary as at {as_of}")?,
    }
    let hour = |t: Option<VTime>| t.map_or_else(|| "?".to_string(), |t| t.to_string());
    writeln!(writer, "Hours: {} to {}", hour(day.time_open), hour(day.time_closed))?;
    writeln!(writer, "Registrations: {}", day.registrations)?;

    let moments = day.moments(Some(as_of));
    if moments.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "No bikes yet.")?;
        return Ok(());
    }

    let totals = day.day_totals(Some(as_of));
    writeln!(writer)?;
    writeln!(writer, "{}", tally_line("Bikes parked:", totals.parked))?;
    writeln!(writer, "{}", tally_line("Bikes left:", totals.leftover))?;

    writeln!(writer)?;
    writeln!(writer, "Most bikes at once:")?;
    for mark in highwater(&moments) {
        let name = mark.category.as_str();
        match mark.at {
            Some(at) => writeln!(writer, "  {name:<10}{:>3} at {at}", mark.count)?,
            None => writeln!(writer, "  {name:<10}{:>3}", mark.count)?,
        }
    }

    let stays = day.stay_lengths(as_of);
    if let Some(stats) = stay_stats(&stays) {
        writeln!(writer)?;
        writeln!(writer, "Length of stays ({} bikes):", stats.count)?;
        writeln!(
            writer,
            "  {:<10}{:>5}  {}",
            "Shortest",
            format_minutes(i64::from(stats.shortest)),
            tag_names(&stats.shortest_tags, config)
        )?;
        writeln!(
            writer,
            "  {:<10}{:>5}  {}",
            "Longest",
            format_minutes(i64::from(stats.longest)),
            tag_names(&stats.longest_tags, config)
        )?;
        writeln!(writer, "  {:<10}{:>5}", "Mean", minutes(stats.mean))?;
        writeln!(writer, "  {:<10}{:>5}", "Median", minutes(stats.median))?;
        let modes = stats
            .modes
            .iter()
            .map(|m| format_minutes(i64::from(*m)))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            writer,
            "  {:<10}{modes:>5} ({} stays)",
            "Mode", stats.mode_occurrences
        )?;

        let durations: Vec<u16> = stays.iter().map(|(_, d)| *d).collect();
        for category in stay_categories(&durations, &config.visit_categories) {
            writeln!(writer, "  {:<10}{:>5}", category.label(), category.count)?;
        }
    }

    let ranks = busiest(&day.blocks(Some(as_of)), config.busiest_ranks);
    if !ranks.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Busiest times:")?;
        for rank in ranks {
            let noun = if rank.activity == 1 { "event" } else { "events" };
            writeln!(
                writer,
                "  {}. {} ({} {noun})",
                rank.rank,
                times(&rank.starts),
                rank.activity
            )?;
        }
    }
    Ok(())
}

/// Activity per half-hour block.
pub fn blocks<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let day = load_for_update(source, config)?;
    let as_of = report_time(as_of, &day)?;
    let blocks = day.blocks(Some(as_of));

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&blocks)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<7}{:>4}{:>5}{:>8}{:>9}{:>6}",
        "Time", "In", "Out", "So far", "On hand", "Most"
    )?;
    for block in &blocks {
        writeln!(
            writer,
            "{:<7}{:>4}{:>5}{:>8}{:>9}{:>6}",
            block.start.to_string(),
            block.num_in.total,
            block.num_out.total,
            block.so_far.total,
            block.full.total,
            block.fullest
        )?;
    }
    Ok(())
}

/// Every instant bikes came or went, with what was on hand after.
pub fn moments<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let day = load_for_update(source, config)?;
    let as_of = report_time(as_of, &day)?;
    let moments = day.moments(Some(as_of));

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&moments)?)?;
        return Ok(());
    }

    writeln!(writer, "{:<7}{:>7}  Events", "Time", "On hand")?;
    for moment in &moments {
        let events = moment
            .checked_in
            .iter()
            .map(|t| format!("+{}", show(t, config)))
            .chain(moment.checked_out.iter().map(|t| format!("-{}", show(t, config))))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            writer,
            "{:<7}{:>7}  {events}",
            moment.time.to_string(),
            moment.on_hand.total
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::util::test_support::{config_in, output, record_visits, source_in};

    use insta::assert_snapshot;

    const VISITS: &[(&str, &str, Option<&str>)] = &[
        ("wa1", "08:00", Some("08:20")),
        ("wa2", "08:15", Some("09:00")),
        ("wa3", "09:10", Some("12:00")),
        ("bf1", "10:00", None),
        ("wb1", "10:10", Some("10:40")),
    ];

    #[test]
    fn summary_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        report(&mut out, &source, &config, Some("18:00")).unwrap();
        assert_snapshot!(output(out), @r"
        Summary for 2024-06-01 as at 18:00
        Hours: 07:00 to 18:00
        Registrations: 0

        Bikes parked:         4 regular   1 oversize   5 total
        Bikes left:           0 regular   1 oversize   1 total

        Most bikes at once:
          regular     2 at 08:15
          oversize    1 at 10:00
          total       3 at 10:10

        Length of stays (5 bikes):
          Shortest   0:20  wa1
          Longest    8:00  bf1
          Mean       2:29
          Median     0:45
          Mode       0:45 (2 stays)
          < 1.5h        3
          1.5-5.0h      1
          >= 5.0h       1

        Busiest times:
          1. 08:00 (3 events)
          2. 09:00, 10:00 (2 events)
          3. 10:30, 12:00 (1 event)
        ");
    }

    #[test]
    fn empty_day_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);

        let mut out = Vec::new();
        report(&mut out, &source, &config, Some("12:00")).unwrap();
        assert!(output(out).ends_with("Registrations: 0\n\nNo bikes yet.\n"));
    }

    #[test]
    fn blocks_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        blocks(&mut out, &source, &config, Some("10:30"), false).unwrap();
        assert_snapshot!(output(out), @r"
        Time     In  Out  So far  On hand  Most
        08:00     2    1       2        1     2
        08:30     0    0       2        1     1
        09:00     1    1       3        1     1
        09:30     0    0       3        1     1
        10:00     2    0       5        3     3
        10:30     0    0       5        3     3
        ");
    }

    #[test]
    fn blocks_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        blocks(&mut out, &source, &config, Some("10:30"), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        let blocks = value.as_array().unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[0]["start"], "08:00");
        assert_eq!(blocks[0]["num_in"]["total"], 2);
        assert_eq!(blocks[4]["ins"], serde_json::json!(["bf1", "wb1"]));
    }

    #[test]
    fn moments_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        moments(&mut out, &source, &config, Some("9:00"), false).unwrap();
        assert_snapshot!(output(out), @r"
        Time   On hand  Events
        08:00        1  +wa1
        08:15        2  +wa2
        08:20        1  -wa1
        09:00        0  -wa2
        ");
    }
}
