//! Minute-resolution time of day.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Local, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):?(\d{2})$").unwrap());

/// Minutes in a day. `24:00` is a valid time, anything later is not.
pub const MINUTES_PER_DAY: u16 = 1440;

/// A time of day as minutes since midnight, `00:00` through `24:00`.
///
/// Parses `H:MM`, `HH:MM`, `HMM`, `HHMM` and the literal `now`.
/// Displays as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VTime(u16);

impl VTime {
    pub const MIDNIGHT: Self = Self(0);
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY);
    pub const LAST_MINUTE: Self = Self(MINUTES_PER_DAY - 1);

    /// Builds a time from a minute count, rejecting anything outside the day.
    pub fn from_minutes(minutes: i64) -> Result<Self, ValidationError> {
        u16::try_from(minutes)
            .ok()
            .filter(|m| *m <= MINUTES_PER_DAY)
            .map(Self)
            .ok_or(ValidationError::TimeOutOfRange { minutes })
    }

    /// Builds a time from hours and minutes.
    pub fn from_hm(hours: u16, minutes: u16) -> Result<Self, ValidationError> {
        if hours > 24 || minutes > 59 {
            return Err(ValidationError::InvalidTime {
                value: format!("{hours}:{minutes:02}"),
            });
        }
        Self::from_minutes(i64::from(hours * 60 + minutes))
    }

    /// The current wall-clock time, truncated to the minute.
    pub fn now() -> Self {
        let now = Local::now();
        #[expect(clippy::cast_possible_truncation, reason = "bounded by 1439")]
        let minutes = (now.hour() * 60 + now.minute()) as u16;
        Self(minutes)
    }

    /// Parses operator or datafile input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("now") {
            return Ok(Self::now());
        }

        let invalid = || ValidationError::InvalidTime {
            value: raw.to_string(),
        };
        let caps = TIME_RE.captures(trimmed).ok_or_else(invalid)?;
        let hours: u16 = caps[1].parse().map_err(|_| invalid())?;
        let minutes: u16 = caps[2].parse().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes).map_err(|_| invalid())
    }

    pub const fn minutes(self) -> u16 {
        self.0
    }

    pub const fn hours(self) -> u16 {
        self.0 / 60
    }

    /// Start of the fixed-width block holding this time.
    pub const fn block_start(self, width: u16) -> Self {
        Self(self.0 - self.0 % width)
    }

    /// Adds minutes, capping at `24:00`.
    pub fn plus(self, minutes: u16) -> Self {
        Self(self.0.saturating_add(minutes).min(MINUTES_PER_DAY))
    }

    /// Signed difference `self - earlier` in minutes.
    pub fn since(self, earlier: Self) -> i32 {
        i32::from(self.0) - i32::from(earlier.0)
    }

    /// `9:05` (no leading zero).
    pub fn short(self) -> String {
        format!("{}:{:02}", self.0 / 60, self.0 % 60)
    }

    /// ` 9:05` (leading zero replaced by a space), for column alignment.
    pub fn tidy(self) -> String {
        format!("{:>2}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl fmt::Display for VTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for VTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VTime> for String {
    fn from(time: VTime) -> Self {
        time.to_string()
    }
}

/// Formats a minute count as `H:MM`, for durations.
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.abs();
    format!("{sign}{}:{:02}", abs / 60, abs % 60)
}
