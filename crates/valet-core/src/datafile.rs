//! Flat-file persistence format for a day.
//!
//! Line-oriented text with header-delimited sections. `#` starts a comment.
//! Check-ins and check-outs are `tag,HH:MM` lines; tag lists are tags
//! separated by whitespace or commas. Note lines start with `-`, so a note
//! can't be mistaken for a header. This module only converts between text
//! and [`TrackerDay`]; reading and writing files is up to the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::biketag::TagStatus;
use crate::day::{DayConfig, TrackerDay};
use crate::tag::{TagId, parse_tag_list};
use crate::time::VTime;

pub const HEADER_BIKES_IN: &str = "Bikes checked in / tags out:";
pub const HEADER_BIKES_OUT: &str = "Bikes checked out / tags in:";
pub const HEADER_DATE: &str = "Date:";
pub const HEADER_OPENS: &str = "Opens:";
pub const HEADER_CLOSES: &str = "Closes:";
pub const HEADER_OLD_DATE: &str = "Valet date:";
pub const HEADER_OLD_OPENS: &str = "Valet opens:";
pub const HEADER_OLD_CLOSES: &str = "Valet closes:";
pub const HEADER_REGISTRATIONS: &str = "Registrations:";
pub const HEADER_NOTES: &str = "Notes:";
pub const HEADER_REGULAR: &str = "Regular-bike tags:";
pub const HEADER_OVERSIZE: &str = "Oversize-bike tags:";
pub const HEADER_RETIRED: &str = "Retired tags:";
pub const HEADER_COLOURS: &str = "Colour codes:";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Leads every written note line, so a note is never read back as a header.
const NOTE_MARKER: char = '-';

/// Every problem found while reading a datafile, each as `file:line: message`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}\nfound {} errors in datafile {file}", .messages.join("\n"), .messages.len())]
pub struct DatafileError {
    pub file: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BikesIn,
    BikesOut,
    Notes,
    Regular,
    Oversize,
    Retired,
    Colours,
    /// After a single-line header; further lines are ignored.
    NotAList,
}

const SECTION_HEADERS: [(&str, Section); 7] = [
    (HEADER_BIKES_IN, Section::BikesIn),
    (HEADER_BIKES_OUT, Section::BikesOut),
    (HEADER_NOTES, Section::Notes),
    (HEADER_REGULAR, Section::Regular),
    (HEADER_OVERSIZE, Section::Oversize),
    (HEADER_RETIRED, Section::Retired),
    (HEADER_COLOURS, Section::Colours),
];

#[derive(Default)]
struct Reader {
    config: DayConfig,
    notes: Vec<String>,
    bikes_in: BTreeMap<TagId, VTime>,
    bikes_out: BTreeMap<TagId, VTime>,
    errors: Vec<String>,
}

impl Reader {
    fn value_header(&mut self, header: &str, value: &str) -> Result<(), String> {
        match header {
            HEADER_DATE | HEADER_OLD_DATE => {
                let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
                    .map_err(|_| format!("Unable to interpret '{value}' as a date"))?;
                self.config.date = Some(date);
            }
            HEADER_OPENS | HEADER_OLD_OPENS | HEADER_CLOSES | HEADER_OLD_CLOSES => {
                let time = VTime::parse(value)
                    .map_err(|_| format!("Unable to interpret '{value}' as a time"))?;
                if matches!(header, HEADER_OPENS | HEADER_OLD_OPENS) {
                    self.config.time_open = Some(time);
                } else {
                    self.config.time_closed = Some(time);
                }
            }
            HEADER_REGISTRATIONS => {
                let count: i64 = value
                    .parse()
                    .map_err(|_| "Unable to read registrations value".to_string())?;
                if count < 0 {
                    return Err("Registrations value < 0".to_string());
                }
                self.config.registrations = u32::try_from(count)
                    .map_err(|_| "Registrations value too large".to_string())?;
            }
            _ => return Err(format!("Unexpected header {header}")),
        }
        Ok(())
    }

    fn tag_list(&mut self, section: Section, line: &str) -> Result<(), String> {
        let (tags, bad) = parse_tag_list(line);
        if !bad.is_empty() {
            return Err(format!("Bad tag(s) in '{line}'"));
        }
        let target = match section {
            Section::Regular => &mut self.config.regular,
            Section::Oversize => &mut self.config.oversize,
            _ => &mut self.config.retired,
        };
        target.extend(tags);
        Ok(())
    }

    fn event(&mut self, section: Section, line: &str) -> Result<(), String> {
        let cells: Vec<&str> = line.split(',').collect();
        let [raw_tag, raw_time] = cells.as_slice() else {
            return Err("Bad line in file".to_string());
        };
        let tag = TagId::new(*raw_tag).map_err(|_| "String does not appear to be a tag".to_string())?;
        let time = VTime::parse(raw_time).map_err(|_| "Poorly formed time value".to_string())?;

        if section == Section::BikesIn {
            if self.bikes_in.contains_key(&tag) {
                return Err(format!("Duplicate {tag} check-in"));
            }
            if self.bikes_out.get(&tag).is_some_and(|out| *out < time) {
                return Err(format!("Tag {tag} check out before check-in"));
            }
            self.bikes_in.insert(tag, time);
        } else {
            if self.bikes_out.contains_key(&tag) {
                return Err(format!("Duplicate {tag} check-out"));
            }
            match self.bikes_in.get(&tag) {
                None => return Err(format!("Tag {tag} checked out but not in")),
                Some(time_in) if *time_in > time => {
                    return Err(format!("Tag {tag} check out before check-in"));
                }
                Some(_) => {}
            }
            self.bikes_out.insert(tag, time);
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before).trim()
}

fn value_header(line: &str) -> Option<(&'static str, &str)> {
    [
        HEADER_OLD_DATE,
        HEADER_OLD_OPENS,
        HEADER_OLD_CLOSES,
        HEADER_DATE,
        HEADER_OPENS,
        HEADER_CLOSES,
        HEADER_REGISTRATIONS,
    ]
    .into_iter()
    .find_map(|header| line.strip_prefix(header).map(|rest| (header, rest.trim())))
}

/// Parses datafile text into a day. `file` names the source in messages.
pub fn parse(text: &str, file: &str) -> Result<TrackerDay, DatafileError> {
    let mut reader = Reader::default();
    let mut section: Option<Section> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_num = index + 1;
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }

        let marked_note = match section {
            Some(Section::Notes) => line.strip_prefix(NOTE_MARKER),
            _ => None,
        };
        if let Some(note) = marked_note {
            reader.notes.push(note.trim_start().to_string());
            continue;
        }

        if let Some((_, next)) = SECTION_HEADERS.iter().find(|(h, _)| line.starts_with(h)) {
            section = Some(*next);
            continue;
        }

        let outcome = if let Some((header, value)) = value_header(line) {
            section = Some(Section::NotAList);
            reader.value_header(header, value)
        } else {
            match section {
                None => Err(format!("Unexpected unintelligibility in line '{line}'")),
                Some(Section::NotAList | Section::Colours) => Ok(()),
                Some(Section::Notes) => {
                    reader.notes.push(line.to_string());
                    Ok(())
                }
                Some(list @ (Section::Regular | Section::Oversize | Section::Retired)) => {
                    reader.tag_list(list, line)
                }
                Some(events @ (Section::BikesIn | Section::BikesOut)) => reader.event(events, line),
            }
        };

        if let Err(message) = outcome {
            reader.errors.push(format!("{file}:{line_num}: {message}"));
        }
    }

    if !reader.errors.is_empty() {
        return Err(DatafileError {
            file: file.to_string(),
            messages: reader.errors,
        });
    }

    let mut day = TrackerDay::new(reader.config);
    for (tag, time_in) in reader.bikes_in {
        let time_out = reader.bikes_out.get(&tag).copied();
        day.restore_visit(tag, time_in, time_out);
    }
    day.notes = reader.notes;

    debug!(file, tags = day.biketags().count(), "parsed datafile");
    Ok(day)
}

fn write_tag_list(
    f: &mut fmt::Formatter<'_>,
    header: &str,
    tags: &BTreeSet<TagId>,
) -> fmt::Result {
    writeln!(f, "{header}")?;
    let mut by_prefix: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for tag in tags {
        by_prefix.entry(tag.prefix()).or_default().push(tag.to_string());
    }
    for line in by_prefix.values() {
        writeln!(f, "{}", line.join(" "))?;
    }
    Ok(())
}

/// A day formatted as datafile text.
pub struct Datafile<'a>(pub &'a TrackerDay);

impl fmt::Display for Datafile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.0;
        writeln!(f, "# Bike valet datafile")?;

        let leftover = day
            .biketags()
            .filter(|b| b.status() == TagStatus::InUse)
            .count();
        match day.latest_event(VTime::END_OF_DAY) {
            Some(latest) => writeln!(f, "# {leftover} bikes left as of {latest}")?,
            None => writeln!(f, "# No bikes")?,
        }

        if let Some(date) = day.date {
            writeln!(f, "{HEADER_DATE} {}", date.format(DATE_FORMAT))?;
        }
        if let Some(open) = day.time_open {
            writeln!(f, "{HEADER_OPENS} {open}")?;
        }
        if let Some(closed) = day.time_closed {
            writeln!(f, "{HEADER_CLOSES} {closed}")?;
        }
        writeln!(f, "{HEADER_REGISTRATIONS} {}", day.registrations)?;

        writeln!(f, "{HEADER_BIKES_IN}")?;
        for biketag in day.biketags() {
            if let Some(time_in) = biketag.time_in() {
                writeln!(f, "{},{time_in}", biketag.tag())?;
            }
        }
        writeln!(f, "{HEADER_BIKES_OUT}")?;
        for biketag in day.biketags() {
            if let Some(time_out) = biketag.time_out() {
                writeln!(f, "{},{time_out}", biketag.tag())?;
            }
        }

        writeln!(f, "{HEADER_NOTES}")?;
        for note in &day.notes {
            writeln!(f, "{NOTE_MARKER} {note}")?;
        }

        writeln!(f, "# Following sections are context for the check-ins/outs")?;
        write_tag_list(f, HEADER_REGULAR, day.regular_tags())?;
        write_tag_list(f, HEADER_OVERSIZE, day.oversize_tags())?;
        write_tag_list(f, HEADER_RETIRED, day.retired_tags())?;
        writeln!(f, "# Normal end of file")
    }
}

/// Renders a day as datafile text.
pub fn render(day: &TrackerDay) -> String {
    Datafile(day).to_string()
}
