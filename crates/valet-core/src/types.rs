//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for raw operator or datafile input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a colour-letter(s) + position-letter + number tag.
    #[error("'{value}' is not a valid tag")]
    InvalidTag { value: String },

    /// The string is not an H:MM, HHMM or "now" time.
    #[error("'{value}' is not a valid time")]
    InvalidTime { value: String },

    /// A minute count outside a single day.
    #[error("{minutes} minutes is outside 00:00-24:00")]
    TimeOutOfRange { minutes: i64 },

    /// Not a `+N`, `-N`, `=N` or `N` registration change.
    #[error("'{value}' is not a registration change (+N, -N or N)")]
    InvalidRegistrationChange { value: String },

    /// Invalid bike type value.
    #[error("invalid bike type: {value}")]
    InvalidBikeType { value: String },
}

/// The kind of bike a tag is issued for.
///
/// A tag's type comes from which configured list it belongs to. Tags that
/// only appear in the retired list have no known type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BikeType {
    Regular,
    Oversize,
    Unknown,
}

impl BikeType {
    /// String representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Oversize => "oversize",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BikeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BikeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "oversize" => Ok(Self::Oversize),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ValidationError::InvalidBikeType {
                value: s.to_string(),
            }),
        }
    }
}

/// Per-category counts: regular, oversize and all bikes together.
///
/// `total` is tracked independently of the two typed counts so that bikes on
/// tags of unknown type still show up in the combined figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub regular: usize,
    pub oversize: usize,
    pub total: usize,
}

impl Tally {
    /// Counts one bike of the given type.
    pub const fn add(&mut self, bike_type: BikeType) {
        match bike_type {
            BikeType::Regular => self.regular += 1,
            BikeType::Oversize => self.oversize += 1,
            BikeType::Unknown => {}
        }
        self.total += 1;
    }

    /// Removes one bike of the given type.
    ///
    /// Saturates at zero; callers apply removals only after the matching
    /// additions.
    pub const fn remove(&mut self, bike_type: BikeType) {
        match bike_type {
            BikeType::Regular => self.regular = self.regular.saturating_sub(1),
            BikeType::Oversize => self.oversize = self.oversize.saturating_sub(1),
            BikeType::Unknown => {}
        }
        self.total = self.total.saturating_sub(1);
    }

    /// Returns the count for one category.
    pub const fn get(&self, category: Category) -> usize {
        match category {
            Category::Regular => self.regular,
            Category::Oversize => self.oversize,
            Category::Total => self.total,
        }
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self {
            regular: self.regular.saturating_sub(other.regular),
            oversize: self.oversize.saturating_sub(other.oversize),
            total: self.total.saturating_sub(other.total),
        }
    }
}

impl std::ops::AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.regular += other.regular;
        self.oversize += other.oversize;
        self.total += other.total;
    }
}

/// Reporting category for tallies and high-water marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Regular,
    Oversize,
    Total,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Regular, Self::Oversize, Self::Total];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Oversize => "oversize",
            Self::Total => "total",
        }
    }
}
