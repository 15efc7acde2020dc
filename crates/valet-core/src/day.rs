//! The day's root aggregate.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::biketag::{BikeTag, TagError, TagStatus};
use crate::tag::TagId;
use crate::time::VTime;
use crate::types::{BikeType, ValidationError};
use crate::visit::BikeVisit;

/// Minutes a check-in or check-out may fall outside operating hours.
pub const OPERATING_HOURS_TOLERANCE: i32 = 120;

/// A rejected day-level operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DayError {
    #[error("tag {tag} is not one of today's tags")]
    UnknownTag { tag: TagId },

    #[error("tag {tag} is not in the regular or oversize tag lists")]
    NotInTagLists { tag: TagId },

    #[error("closing time {closed} must be later than opening time {open}")]
    BadHours { open: VTime, closed: VTime },

    #[error("registrations can't be set to {count}")]
    BadRegistrations { count: i64 },

    #[error(transparent)]
    Tag(#[from] TagError),
}

/// A change to the day's count of bike registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationChange {
    Add(u32),
    Remove(u32),
    Set(u32),
}

impl FromStr for RegistrationChange {
    type Err = ValidationError;

    /// Parses `+N`, `-N`, `=N` or a bare `N`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (change, number): (fn(u32) -> Self, &str) =
            if let Some(rest) = trimmed.strip_prefix('+') {
                (Self::Add, rest)
            } else if let Some(rest) = trimmed.strip_prefix('-') {
                (Self::Remove, rest)
            } else {
                (Self::Set, trimmed.strip_prefix('=').unwrap_or(trimmed))
            };
        let invalid = || ValidationError::InvalidRegistrationChange {
            value: raw.to_string(),
        };
        let number = number.trim();
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        number.parse().map(change).map_err(|_| invalid())
    }
}

/// Which event of a visit an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InOut {
    In,
    Out,
}

/// What a delete removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteWhat {
    /// The whole visit.
    Both,
    /// Only the check-out.
    Out,
}

/// Result of looking up one tag at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TagQuery {
    NotFound,
    CheckedIn { time_in: VTime },
    CheckedOut { time_in: VTime, time_out: VTime },
    Retired,
}

/// Everything needed to start a fresh day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayConfig {
    pub date: Option<NaiveDate>,
    pub time_open: Option<VTime>,
    pub time_closed: Option<VTime>,
    pub registrations: u32,
    pub regular: BTreeSet<TagId>,
    pub oversize: BTreeSet<TagId>,
    pub retired: BTreeSet<TagId>,
}

/// One day of valet operation: hours, tag lists, tags and notes.
///
/// Retired tags may also appear in the regular or oversize lists; the
/// retired list is an overlay saying "don't hand this one out today".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerDay {
    pub date: Option<NaiveDate>,
    pub time_open: Option<VTime>,
    pub time_closed: Option<VTime>,
    pub registrations: u32,
    pub notes: Vec<String>,
    regular: BTreeSet<TagId>,
    oversize: BTreeSet<TagId>,
    retired: BTreeSet<TagId>,
    biketags: BTreeMap<TagId, BikeTag>,
}

impl TrackerDay {
    pub fn new(config: DayConfig) -> Self {
        let mut day = Self {
            date: config.date,
            time_open: config.time_open,
            time_closed: config.time_closed,
            registrations: config.registrations,
            notes: Vec::new(),
            regular: config.regular,
            oversize: config.oversize,
            retired: config.retired,
            biketags: BTreeMap::new(),
        };
        day.initialize_biketags();
        day
    }

    /// Builds an unused tag for every listed tag id, then overlays retirement.
    fn initialize_biketags(&mut self) {
        for tag in self.regular.iter().chain(&self.oversize).chain(&self.retired) {
            if !self.biketags.contains_key(tag) {
                let bike_type = self.configured_type(tag);
                self.biketags
                    .insert(tag.clone(), BikeTag::new(tag.clone(), bike_type));
            }
        }
        for tag in &self.retired {
            if let Some(biketag) = self.biketags.get_mut(tag) {
                // Only fails for tags already in use; harmonize sorts those out.
                if let Err(err) = biketag.retire() {
                    debug!(%err, "listed as retired but left in service");
                }
            }
        }
    }

    fn configured_type(&self, tag: &TagId) -> BikeType {
        if self.regular.contains(tag) {
            BikeType::Regular
        } else if self.oversize.contains(tag) {
            BikeType::Oversize
        } else {
            BikeType::Unknown
        }
    }

    pub const fn regular_tags(&self) -> &BTreeSet<TagId> {
        &self.regular
    }

    pub const fn oversize_tags(&self) -> &BTreeSet<TagId> {
        &self.oversize
    }

    pub const fn retired_tags(&self) -> &BTreeSet<TagId> {
        &self.retired
    }

    /// Tags that may be handed out today.
    pub fn usable_tags(&self) -> BTreeSet<TagId> {
        self.regular
            .union(&self.oversize)
            .filter(|t| !self.retired.contains(t))
            .cloned()
            .collect()
    }

    pub fn biketag(&self, tag: &TagId) -> Option<&BikeTag> {
        self.biketags.get(tag)
    }

    /// All tags, in tag order.
    pub fn biketags(&self) -> impl Iterator<Item = &BikeTag> {
        self.biketags.values()
    }

    fn biketag_mut(&mut self, tag: &TagId) -> Result<&mut BikeTag, DayError> {
        self.biketags
            .get_mut(tag)
            .ok_or_else(|| DayError::UnknownTag { tag: tag.clone() })
    }

    /// Replaces the reference tag lists, e.g. from a changed configuration.
    ///
    /// Unused tags no longer listed are dropped. Run [`Self::harmonize`]
    /// afterwards to reconcile the new lists with tags already used today.
    pub fn set_tag_lists(
        &mut self,
        regular: BTreeSet<TagId>,
        oversize: BTreeSet<TagId>,
        retired: BTreeSet<TagId>,
    ) {
        self.regular = regular;
        self.oversize = oversize;
        self.retired = retired;
        let listed: BTreeSet<TagId> = self
            .regular
            .iter()
            .chain(&self.oversize)
            .chain(&self.retired)
            .cloned()
            .collect();
        self.biketags
            .retain(|tag, biketag| biketag.is_used() || listed.contains(tag));
        for tag in &listed {
            if !self.biketags.contains_key(tag) {
                let bike_type = self.configured_type(tag);
                self.biketags
                    .insert(tag.clone(), BikeTag::new(tag.clone(), bike_type));
            }
        }
    }

    /// Makes the tag lists and tag statuses agree with today's visits.
    ///
    /// Returns a message for each change that the operator should know of.
    pub fn harmonize(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();

        for biketag in self.biketags.values_mut() {
            if biketag.status() == TagStatus::Retired && !self.retired.contains(biketag.tag()) {
                if let Err(err) = biketag.unretire() {
                    debug!(%err, "no longer listed as retired but left retired");
                }
            }
        }

        for tag in self.retired.clone() {
            let Some(biketag) = self.biketags.get_mut(&tag) else {
                continue;
            };
            match biketag.status() {
                TagStatus::Unused => {
                    if let Err(err) = biketag.retire() {
                        debug!(%err, "listed as retired but left in service");
                    }
                }
                TagStatus::Retired => {}
                TagStatus::InUse | TagStatus::Done => {
                    self.retired.remove(&tag);
                    fixes.push(format!("Tag {tag} was used today so is no longer retired."));
                }
            }
        }

        for (tag, biketag) in &mut self.biketags {
            let configured = if self.regular.contains(tag) {
                BikeType::Regular
            } else if self.oversize.contains(tag) {
                BikeType::Oversize
            } else {
                BikeType::Unknown
            };
            if configured == biketag.bike_type() {
                continue;
            }
            if !biketag.is_used() {
                biketag.set_bike_type(configured);
                continue;
            }
            let kept = biketag.bike_type();
            match kept {
                BikeType::Regular => {
                    self.oversize.remove(tag);
                    self.regular.insert(tag.clone());
                }
                BikeType::Oversize => {
                    self.regular.remove(tag);
                    self.oversize.insert(tag.clone());
                }
                BikeType::Unknown => {
                    biketag.set_bike_type(configured);
                    continue;
                }
            }
            fixes.push(format!("Tag {tag} remains {kept}, not {configured}."));
        }

        for fix in &fixes {
            warn!("{fix}");
        }
        fixes
    }

    /// Whether `time` is within two hours of operating hours.
    pub fn bike_time_reasonable(&self, time: VTime) -> bool {
        match (self.time_open, self.time_closed) {
            (Some(open), Some(closed)) => {
                let t = i32::from(time.minutes());
                i32::from(open.minutes()) - OPERATING_HOURS_TOLERANCE <= t
                    && t <= i32::from(closed.minutes()) + OPERATING_HOURS_TOLERANCE
            }
            _ => true,
        }
    }

    fn note_unusual_time(&self, tag: &TagId, time: VTime) {
        if !self.bike_time_reasonable(time) {
            warn!(%tag, %time, "time is well outside operating hours");
        }
    }

    pub fn check_in(&mut self, tag: &TagId, time: VTime) -> Result<(), DayError> {
        self.note_unusual_time(tag, time);
        self.biketag_mut(tag)?.check_in(time)?;
        Ok(())
    }

    pub fn check_out(&mut self, tag: &TagId, time: VTime) -> Result<(), DayError> {
        self.note_unusual_time(tag, time);
        self.biketag_mut(tag)?.check_out(time)?;
        Ok(())
    }

    pub fn edit(&mut self, tag: &TagId, which: InOut, time: VTime) -> Result<(), DayError> {
        self.note_unusual_time(tag, time);
        let biketag = self.biketag_mut(tag)?;
        match which {
            InOut::In => biketag.edit_in(time)?,
            InOut::Out => biketag.edit_out(time)?,
        }
        Ok(())
    }

    /// Deletes a check-out, or a whole visit.
    ///
    /// `Both` on a finished visit removes the check-out and then the check-in.
    pub fn delete(&mut self, tag: &TagId, what: DeleteWhat) -> Result<(), DayError> {
        let biketag = self.biketag_mut(tag)?;
        match what {
            DeleteWhat::Out => biketag.delete_out()?,
            DeleteWhat::Both => {
                if biketag.status() == TagStatus::Done {
                    biketag.delete_out()?;
                }
                biketag.delete_in()?;
            }
        }
        Ok(())
    }

    /// Where `tag` stood at `as_of`.
    pub fn query(&self, tag: &TagId, as_of: VTime) -> TagQuery {
        let Some(biketag) = self.biketags.get(tag) else {
            return TagQuery::NotFound;
        };
        match (biketag.status_as_at(as_of), biketag.time_in(), biketag.time_out()) {
            (TagStatus::Retired, ..) => TagQuery::Retired,
            (TagStatus::InUse, Some(time_in), _) => TagQuery::CheckedIn { time_in },
            (TagStatus::Done, Some(time_in), Some(time_out)) => {
                TagQuery::CheckedOut { time_in, time_out }
            }
            _ => TagQuery::NotFound,
        }
    }

    /// Retires an unused tag for the rest of the day. Returns whether anything changed.
    pub fn retire_tag(&mut self, tag: &TagId) -> Result<bool, DayError> {
        let biketag = self.biketag_mut(tag)?;
        let was_retired = biketag.status() == TagStatus::Retired;
        biketag.retire()?;
        let added = self.retired.insert(tag.clone());
        Ok(added || !was_retired)
    }

    /// Makes a retired tag usable again. Returns whether anything changed.
    pub fn unretire_tag(&mut self, tag: &TagId) -> Result<bool, DayError> {
        if self.configured_type(tag) == BikeType::Unknown {
            return Err(DayError::NotInTagLists { tag: tag.clone() });
        }
        let biketag = self.biketag_mut(tag)?;
        let was_retired = biketag.status() == TagStatus::Retired;
        biketag.unretire()?;
        let removed = self.retired.remove(tag);
        Ok(removed || was_retired)
    }

    /// Sets today's operating hours. Returns whether they changed.
    pub fn set_hours(&mut self, open: VTime, closed: VTime) -> Result<bool, DayError> {
        if open >= closed {
            return Err(DayError::BadHours { open, closed });
        }
        let changed = self.time_open != Some(open) || self.time_closed != Some(closed);
        self.time_open = Some(open);
        self.time_closed = Some(closed);
        if changed {
            debug!(%open, %closed, "operating hours set");
        }
        Ok(changed)
    }

    /// Applies a change to the registration count and returns the new count.
    ///
    /// The count never goes below zero; such a change is rejected whole.
    pub fn change_registrations(&mut self, change: RegistrationChange) -> Result<u32, DayError> {
        let current = i64::from(self.registrations);
        let count = match change {
            RegistrationChange::Add(n) => current + i64::from(n),
            RegistrationChange::Remove(n) => current - i64::from(n),
            RegistrationChange::Set(n) => i64::from(n),
        };
        self.registrations =
            u32::try_from(count).map_err(|_| DayError::BadRegistrations { count })?;
        debug!(registrations = self.registrations, "registrations changed");
        Ok(self.registrations)
    }

    /// Restores a persisted visit, bypassing the transition rules.
    ///
    /// Tags outside today's lists are accepted with an unknown type so that
    /// lint can report them.
    pub fn restore_visit(&mut self, tag: TagId, time_in: VTime, time_out: Option<VTime>) {
        let bike_type = self.configured_type(&tag);
        self.biketags.insert(
            tag.clone(),
            BikeTag::restore(tag, bike_type, time_in, time_out),
        );
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Every visit, ordered by check-in time.
    pub fn all_visits(&self) -> Vec<&BikeVisit> {
        let mut visits: Vec<&BikeVisit> = self
            .biketags
            .values()
            .flat_map(BikeTag::visits)
            .collect();
        visits.sort_by_key(|v| v.time_in);
        visits
    }

    fn event_times(&self) -> impl Iterator<Item = VTime> + '_ {
        self.biketags
            .values()
            .flat_map(BikeTag::visits)
            .flat_map(|v| std::iter::once(v.time_in).chain(v.time_out))
    }

    pub fn earliest_event(&self) -> Option<VTime> {
        self.event_times().min()
    }

    /// Latest check-in or check-out at or before `as_of`.
    pub fn latest_event(&self, as_of: VTime) -> Option<VTime> {
        self.event_times().filter(|t| *t <= as_of).max()
    }

    /// Number of distinct event times after `after`.
    pub fn num_later_events(&self, after: VTime) -> usize {
        self.event_times()
            .filter(|t| *t > after)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Tags with a bike on-site at `as_of`.
    pub fn tags_in_use(&self, as_of: VTime) -> Vec<&TagId> {
        self.tags_with_status(as_of, TagStatus::InUse)
    }

    /// Tags whose bike has left by `as_of`.
    pub fn tags_done(&self, as_of: VTime) -> Vec<&TagId> {
        self.tags_with_status(as_of, TagStatus::Done)
    }

    fn tags_with_status(&self, as_of: VTime, status: TagStatus) -> Vec<&TagId> {
        self.biketags
            .values()
            .filter(|b| b.status_as_at(as_of) == status)
            .map(BikeTag::tag)
            .collect()
    }

    /// Day-level consistency problems, one message each. Empty means clean.
    ///
    /// `strict` also requires a date and sensible operating hours.
    pub fn lint(&self, strict: bool) -> Vec<String> {
        let mut errors = Vec::new();

        if strict {
            if self.date.is_none() {
                errors.push("Missing date.".to_string());
            }
            if self.time_open.is_none() {
                errors.push("Missing opening time.".to_string());
            }
            if self.time_closed.is_none() {
                errors.push("Missing closing time.".to_string());
            }
        }
        if let (Some(open), Some(closed)) = (self.time_open, self.time_closed) {
            if open >= closed {
                errors.push(format!(
                    "Opening time {open} must be earlier than closing time {closed}."
                ));
            }
        }

        for tag in self.regular.intersection(&self.oversize) {
            errors.push(format!("Tag {tag} is listed as both regular and oversize."));
        }

        for (tag, biketag) in &self.biketags {
            errors.extend(biketag.lint_check());

            if biketag.is_used() {
                if !self.regular.contains(tag) && !self.oversize.contains(tag) {
                    errors.push(format!(
                        "Tag {tag} has a visit but is not a regular or oversize tag."
                    ));
                }
                if self.retired.contains(tag) {
                    errors.push(format!("Tag {tag} has a visit but is retired."));
                }
            } else if biketag.status() == TagStatus::Retired {
                if !self.retired.contains(tag) {
                    errors.push(format!("Tag {tag} is retired but not in the retired list."));
                }
            } else if !self.regular.contains(tag) && !self.oversize.contains(tag) {
                errors.push(format!(
                    "Tag {tag} is available but not in the regular or oversize lists."
                ));
            }
        }

        debug!(strict, violations = errors.len(), "lint");
        errors
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn initialize_assigns_types_and_retires() {
        let day = sample_day();
        assert_eq!(day.biketag(&tag("wa1")).unwrap().bike_type(), BikeType::Regular);
        assert_eq!(day.biketag(&tag("bf1")).unwrap().bike_type(), BikeType::Oversize);
        assert_eq!(day.biketag(&tag("wb9")).unwrap().status(), TagStatus::Retired);
        assert!(!day.usable_tags().contains(&tag("wb9")));
        assert!(day.usable_tags().contains(&tag("wb8")));
        assert!(day.lint(true).is_empty());
    }

    #[test]
    fn retired_only_tag_has_unknown_type() {
        let day = TrackerDay::new(DayConfig {
            retired: tags("zz1"),
            ..DayConfig::default()
        });
        assert_eq!(day.biketag(&tag("zz1")).unwrap().bike_type(), BikeType::Unknown);
    }

    #[test]
    fn check_in_and_out_then_query() {
        let mut day = sample_day();
        day.check_in(&tag("wa3"), at("09:00")).unwrap();
        day.check_out(&tag("WA03"), at("09:45")).unwrap();

        assert_eq!(
            day.query(&tag("wa3"), at("18:00")),
            TagQuery::CheckedOut {
                time_in: at("09:00"),
                time_out: at("09:45"),
            }
        );
        assert_eq!(
            day.query(&tag("wa3"), at("09:30")),
            TagQuery::CheckedIn { time_in: at("09:00") }
        );
        assert_eq!(day.query(&tag("wa3"), at("08:00")), TagQuery::NotFound);
        assert_eq!(day.query(&tag("zz9"), at("08:00")), TagQuery::NotFound);
        assert_eq!(day.query(&tag("wb9"), at("08:00")), TagQuery::Retired);
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut day = sample_day();
        assert_eq!(
            day.check_in(&tag("zz1"), at("09:00")),
            Err(DayError::UnknownTag { tag: tag("zz1") })
        );
    }

    #[test]
    fn edit_out_before_check_in_leaves_day_unchanged() {
        let mut day = sample_day();
        day.check_in(&tag("wa3"), at("09:00")).unwrap();
        let before = day.clone();
        let err = day.edit(&tag("wa3"), InOut::Out, at("08:30")).unwrap_err();
        assert!(matches!(err, DayError::Tag(TagError::CheckoutBeforeCheckin { .. })));
        assert_eq!(day, before);
    }

    #[test]
    fn delete_out_then_both() {
        let mut day = sample_day();
        day.check_in(&tag("wa3"), at("09:00")).unwrap();
        day.check_out(&tag("wa3"), at("09:45")).unwrap();

        day.delete(&tag("wa3"), DeleteWhat::Out).unwrap();
        let wa3 = day.biketag(&tag("wa3")).unwrap();
        assert_eq!(wa3.status(), TagStatus::InUse);
        assert_eq!(wa3.time_in(), Some(at("09:00")));
        assert_eq!(wa3.time_out(), None);

        day.check_out(&tag("wa3"), at("10:00")).unwrap();
        day.delete(&tag("wa3"), DeleteWhat::Both).unwrap();
        assert_eq!(day.biketag(&tag("wa3")).unwrap().status(), TagStatus::Unused);
        assert!(day.delete(&tag("wa3"), DeleteWhat::Both).is_err());
    }

    #[test]
    fn retire_and_unretire() {
        let mut day = sample_day();
        assert_eq!(day.retire_tag(&tag("wa1")), Ok(true));
        assert_eq!(day.retire_tag(&tag("wa1")), Ok(false));
        assert!(day.retired_tags().contains(&tag("wa1")));
        assert!(day.check_in(&tag("wa1"), at("09:00")).is_err());

        assert_eq!(day.unretire_tag(&tag("wa1")), Ok(true));
        day.check_in(&tag("wa1"), at("09:00")).unwrap();
        assert!(day.retire_tag(&tag("wa1")).is_err());
        assert!(day.lint(true).is_empty());
    }

    #[test]
    fn unretire_needs_a_listed_tag() {
        let mut day = TrackerDay::new(DayConfig {
            retired: tags("zz1"),
            ..DayConfig::default()
        });
        assert_eq!(
            day.unretire_tag(&tag("zz1")),
            Err(DayError::NotInTagLists { tag: tag("zz1") })
        );
    }

    #[test]
    fn harmonize_unretires_used_tags() {
        let mut day = sample_day();
        day.restore_visit(tag("wb9"), at("09:00"), None);
        assert!(!day.lint(false).is_empty());

        let fixes = day.harmonize();
        assert_eq!(fixes, vec!["Tag wb9 was used today so is no longer retired."]);
        assert!(!day.retired_tags().contains(&tag("wb9")));
        assert!(day.lint(false).is_empty());
    }

    #[test]
    fn harmonize_after_list_change() {
        let mut day = sample_day();
        day.check_in(&tag("wa1"), at("09:00")).unwrap();

        // wa1 moves to oversize, wa2 gets retired, wb9 is back in service
        let mut regular = day.regular_tags().clone();
        regular.remove(&tag("wa1"));
        let mut oversize = day.oversize_tags().clone();
        oversize.insert(tag("wa1"));
        day.set_tag_lists(regular, oversize, tags("wa2"));

        let fixes = day.harmonize();
        assert_eq!(fixes, vec!["Tag wa1 remains regular, not oversize."]);
        assert!(day.regular_tags().contains(&tag("wa1")));
        assert!(!day.oversize_tags().contains(&tag("wa1")));
        assert_eq!(day.biketag(&tag("wa2")).unwrap().status(), TagStatus::Retired);
        assert_eq!(day.biketag(&tag("wb9")).unwrap().status(), TagStatus::Unused);
        assert!(day.lint(true).is_empty());
    }

    #[test]
    fn lint_reports_unlisted_tag() {
        let mut day = sample_day();
        day.restore_visit(tag("zz7"), at("10:00"), Some(at("11:00")));
        let errors = day.lint(true);
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.contains("zz7")));
        assert_eq!(errors, day.lint(true));
    }

    #[test]
    fn set_hours_requires_open_before_close() {
        let mut day = sample_day();
        assert_eq!(day.set_hours(at("07:00"), at("18:00")), Ok(false));
        assert_eq!(day.set_hours(at("08:30"), at("17:00")), Ok(true));
        assert_eq!((day.time_open, day.time_closed), (Some(at("08:30")), Some(at("17:00"))));

        let err = day.set_hours(at("17:00"), at("17:00")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "closing time 17:00 must be later than opening time 17:00"
        );
        assert_eq!(day.time_open, Some(at("08:30")));
    }

    #[test]
    fn registrations_never_go_negative() {
        let mut day = sample_day();
        let change = |raw: &str| raw.parse::<RegistrationChange>().unwrap();
        assert_eq!(day.change_registrations(change("+3")), Ok(3));
        assert_eq!(day.change_registrations(change("- 1")), Ok(2));
        assert_eq!(
            day.change_registrations(change("-5")),
            Err(DayError::BadRegistrations { count: -3 })
        );
        assert_eq!(day.registrations, 2);
        assert_eq!(day.change_registrations(change("=7")), Ok(7));
        assert_eq!(day.change_registrations(change("4")), Ok(4));

        for bad in ["", "+", "++2", "two", "-1.5"] {
            assert!(bad.parse::<RegistrationChange>().is_err(), "{bad}");
        }
    }

    #[test]
    fn lint_reports_overlap_and_bad_hours() {
        let mut day = sample_day();
        day.time_open = Some(at("19:00"));
        day.date = None;
        let mut oversize = day.oversize_tags().clone();
        oversize.insert(tag("wa1"));
        let regular = day.regular_tags().clone();
        day.set_tag_lists(regular, oversize, tags("wb9"));

        let errors = day.lint(true);
        assert_eq!(
            errors,
            vec![
                "Missing date.".to_string(),
                "Opening time 19:00 must be earlier than closing time 18:00.".to_string(),
                "Tag wa1 is listed as both regular and oversize.".to_string(),
            ]
        );
        assert_eq!(day.lint(false).len(), 2);
    }

    #[test]
    fn event_queries() {
        let mut day = sample_day();
        assert_eq!(day.earliest_event(), None);
        day.check_in(&tag("wa1"), at("08:00")).unwrap();
        day.check_in(&tag("wa2"), at("08:15")).unwrap();
        day.check_out(&tag("wa1"), at("08:20")).unwrap();
        day.check_in(&tag("bf1"), at("10:00")).unwrap();

        assert_eq!(day.earliest_event(), Some(at("08:00")));
        assert_eq!(day.latest_event(at("09:00")), Some(at("08:20")));
        assert_eq!(day.latest_event(at("07:00")), None);
        assert_eq!(day.num_later_events(at("08:00")), 3);
        assert_eq!(day.tags_in_use(at("08:30")), vec![&tag("wa2")]);
        assert_eq!(day.tags_done(at("08:30")), vec![&tag("wa1")]);

        let order: Vec<String> = day.all_visits().iter().map(|v| v.tag.to_string()).collect();
        assert_eq!(order, ["wa1", "wa2", "bf1"]);
    }

    #[test]
    fn time_reasonableness() {
        let mut day = sample_day();
        assert!(day.bike_time_reasonable(at("05:00")));
        assert!(!day.bike_time_reasonable(at("04:59")));
        assert!(day.bike_time_reasonable(at("20:00")));
        assert!(!day.bike_time_reasonable(at("20:01")));
        day.time_open = None;
        assert!(day.bike_time_reasonable(at("01:00")));
    }
}
