//! Note and lint commands.

use std::io::Write;

use anyhow::Result;

use super::util::{DaySource, load, load_for_update, save};
use crate::Config;

/// Appends an operator note to the day.
pub fn note<W: Write>(
    writer: &mut W,
    source: &DaySource,
    config: &Config,
    words: &[String],
) -> Result<()> {
    let text = words.join(" ");
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("note is empty");
    }
    // '#' starts a comment in the datafile
    if text.contains('#') {
        anyhow::bail!("notes can't contain '#'");
    }
    if text.contains(['\n', '\r']) {
        anyhow::bail!("notes must fit on one line");
    }

    let mut day = load_for_update(source, config)?;
    day.add_note(text);
    save(&source.path, &day)?;
    writeln!(writer, "Note added ({} today)", day.notes.len())?;
    Ok(())
}

/// Reports every consistency problem in the datafile.
pub fn lint<W: Write>(writer: &mut W, source: &DaySource, strict: bool) -> Result<()> {
    let day = load(source)?;
    let errors = day.lint(strict);
    if errors.is_empty() {
        writeln!(writer, "No problems found.")?;
        return Ok(());
    }
    for error in &errors {
        writeln!(writer, "{error}")?;
    }
    anyhow::bail!("found {} problems in {}", errors.len(), source.path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::util::test_support::{config_in, output, source_in};

    use insta::assert_snapshot;

    #[test]
    fn notes_are_kept_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);

        let mut out = Vec::new();
        note(&mut out, &source, &config, &["wa2".into(), "lock".into(), "loose".into()]).unwrap();
        note(&mut out, &source, &config, &["rain at noon".into()]).unwrap();
        assert_eq!(output(out), "Note added (1 today)\nNote added (2 today)\n");

        let day = load(&source).unwrap();
        assert_eq!(day.notes, ["wa2 lock loose", "rain at noon"]);
        assert!(note(&mut Vec::new(), &source, &config, &["tag #4".into()]).is_err());
        assert!(note(&mut Vec::new(), &source, &config, &["  ".into()]).is_err());
    }

    #[test]
    fn header_like_notes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);

        for text in ["Closes: early because of the storm", "Opens: 09:30", "Retired tags: none today"] {
            note(&mut Vec::new(), &source, &config, &[text.to_string()]).unwrap();
        }
        // a later command still loads the day
        note(&mut Vec::new(), &source, &config, &["Registrations: 12 forms handed out".into()])
            .unwrap();

        let day = load(&source).unwrap();
        assert_eq!(
            day.notes,
            [
                "Closes: early because of the storm",
                "Opens: 09:30",
                "Retired tags: none today",
                "Registrations: 12 forms handed out",
            ]
        );
        assert_eq!(day.time_open.map(|t| t.to_string()), Some("07:00".to_string()));
        assert_eq!(day.time_closed.map(|t| t.to_string()), Some("18:00".to_string()));
        assert_eq!(day.registrations, 0);
        assert!(note(&mut Vec::new(), &source, &config, &["two\nlines".into()]).is_err());
    }

    #[test]
    fn lint_lists_problems() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(&config_in(dir.path()));
        std::fs::write(
            &source.path,
            "\
Date: 2024-06-01
Opens: 18:00
Closes: 07:00
Bikes checked in / tags out:
wa1,09:00
zz9,09:30
Regular-bike tags:
wa1 wa2
Oversize-bike tags:
wa2
",
        )
        .unwrap();

        let mut out = Vec::new();
        let err = lint(&mut out, &source, false).unwrap_err();
        assert!(err.to_string().starts_with("found 3 problems"), "{err}");
        assert_snapshot!(output(out), @r"
        Opening time 18:00 must be earlier than closing time 07:00.
        Tag wa2 is listed as both regular and oversize.
        Tag zz9 has a visit but is not a regular or oversize tag.
        ");
    }

    #[test]
    fn clean_day_passes_strict_lint() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = source_in(&config);
        super::super::init::run(&mut Vec::new(), &source, &config).unwrap();

        let mut out = Vec::new();
        lint(&mut out, &source, true).unwrap();
        assert_eq!(output(out), "No problems found.\n");
    }
}
