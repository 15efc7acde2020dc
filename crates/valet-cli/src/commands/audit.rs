//! Audit command: what should be on the rack right now.

use std::io::Write;

use anyhow::Result;
use valet_core::TagMatrix;

use super::util::{DaySource, load_for_update, report_time, tally_line};
use crate::Config;

fn write_matrix<W: Write>(
    writer: &mut W,
    title: &str,
    matrix: &TagMatrix,
    config: &Config,
) -> Result<()> {
    writeln!(writer, "{title}")?;
    if matrix.is_empty() {
        writeln!(writer, "(none)")?;
    }
    for line in matrix.render(config.uppercase_tags) {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

pub fn run<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    as_of: Option<&str>,
    leftover: Option<usize>,
    returns: bool,
) -> Result<()> {
    let day = load_for_update(source, config)?;
    let as_of = report_time(as_of, &day)?;
    let summary = day.inout_summary(as_of);

    match day.date {
        Some(date) => writeln!(writer, "Audit of {date} as at {as_of}")?,
        None => writeln!(writer, "Audit as at {as_of}")?,
    }
    writeln!(writer, "{}", tally_line("Bikes checked in:", summary.checked_in))?;
    writeln!(writer, "{}", tally_line("Bikes returned:", summary.returned))?;
    writeln!(writer, "{}", tally_line("Bikes on hand:", summary.on_site))?;

    writeln!(writer)?;
    write_matrix(writer, "Tags on hand:", &day.on_hand_matrix(as_of), config)?;
    if returns {
        writeln!(writer)?;
        write_matrix(writer, "Tags returned:", &day.returned_matrix(as_of), config)?;
    }

    if let Some(reported) = leftover {
        let check = day.reconcile_leftovers(as_of, reported);
        writeln!(writer)?;
        match check.discrepancy() {
            Some(message) => {
                tracing::warn!(recorded = check.recorded, reported, "leftover mismatch");
                writeln!(writer, "{message}")?;
            }
            None => writeln!(writer, "Leftover count matches: {} bikes.", check.recorded)?,
        }
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
        ("wa2", "08:15", None),
        ("wa5", "09:10", Some("12:00")),
        ("bf1", "10:00", None),
        ("wb1", "10:10", None),
    ];

    #[test]
    fn audit_shows_tags_on_hand() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        run(&mut out, &source, &config, Some("11:00"), Some(3), true).unwrap();
        assert_snapshot!(output(out), @r"
        Audit of 2024-06-01 as at 11:00
        Bikes checked in:     4 regular   1 oversize   5 total
        Bikes returned:       1 regular   0 oversize   1 total
        Bikes on hand:        3 regular   1 oversize   4 total

        Tags on hand:
        bf     01
        wa        02       05
        wb     01     ●

        Tags returned:
        wa     01

        4 bikes recorded as left over but 3 reported.
        ");
    }

    #[test]
    fn audit_before_any_bikes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.uppercase_tags = true;
        let source = source_in(&config);
        record_visits(&config, &source, VISITS);

        let mut out = Vec::new();
        run(&mut out, &source, &config, Some("7:30"), Some(0), false).unwrap();
        let out = output(out);
        assert!(out.contains("Tags on hand:\n(none)\n"), "{out}");
        assert!(out.ends_with("Leftover count matches: 0 bikes.\n"), "{out}");

        let mut out = Vec::new();
        run(&mut out, &source, &config, Some("10:05"), None, false).unwrap();
        assert!(output(out).ends_with("\nBF     01\nWA        02       05\n"));
    }
}
