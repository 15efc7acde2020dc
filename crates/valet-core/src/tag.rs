//! Tag identifiers.
//!
//! A tag id is one or more colour letters, a position letter and a number,
//! e.g. `wa3` (colour `w`, letter `a`, number 3). Parsing is case-insensitive
//! and ignores leading zeros on the number, so `WA03`, ` wa3 ` and `wa003`
//! are all the same tag.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Letters, then digits. The last letter is the position letter.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]*[a-z])0*([0-9]+)$").unwrap());

/// A validated, canonical tag identifier.
///
/// Equality, hashing and ordering use only the canonical (prefix, number)
/// pair. Ordering is numeric within a prefix, so `wa2 < wa10`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagId {
    prefix: String,
    number: u32,
    original: String,
}

impl TagId {
    /// Parses and canonicalizes a raw tag string.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let original = raw.into();
        let lowered = original.trim().to_ascii_lowercase();
        let invalid = || ValidationError::InvalidTag {
            value: original.clone(),
        };

        let caps = TAG_RE.captures(&lowered).ok_or_else(invalid)?;
        let prefix = caps[1].to_string();
        if prefix.len() < 2 {
            return Err(invalid());
        }
        let number = caps[2].parse::<u32>().map_err(|_| invalid())?;

        Ok(Self {
            prefix,
            number,
            original,
        })
    }

    /// Colour letters plus position letter, lowercase (e.g. `wa`).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Colour letter(s), lowercase.
    pub fn colour(&self) -> &str {
        &self.prefix[..self.prefix.len() - 1]
    }

    /// Position letter, lowercase.
    pub fn letter(&self) -> char {
        self.prefix.chars().last().unwrap_or_default()
    }

    pub const fn number(&self) -> u32 {
        self.number
    }

    /// The string this tag was parsed from, untouched.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Zero-padded form (`wa003`) used for fixed-width display.
    pub fn full(&self) -> String {
        format!("{}{:03}", self.prefix, self.number)
    }

    /// Canonical form in the requested case.
    pub fn cased(&self, uppercase: bool) -> String {
        let canonical = self.to_string();
        if uppercase {
            canonical.to_ascii_uppercase()
        } else {
            canonical
        }
    }
}

impl PartialEq for TagId {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.number == other.number
    }
}

impl Eq for TagId {}

impl Hash for TagId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.prefix.hash(state);
        self.number.hash(state);
    }
}

impl Ord for TagId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(&other.prefix)
            .then(self.number.cmp(&other.number))
    }
}

impl PartialOrd for TagId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

impl FromStr for TagId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TagId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagId> for String {
    fn from(tag: TagId) -> Self {
        tag.to_string()
    }
}

/// Splits a line of tags on whitespace and commas.
///
/// Returns the valid tags and the raw tokens that failed to parse.
pub fn parse_tag_list(line: &str) -> (Vec<TagId>, Vec<String>) {
    let mut tags = Vec::new();
    let mut bad = Vec::new();
    for token in line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match TagId::new(token) {
            Ok(tag) => tags.push(tag),
            Err(_) => bad.push(token.to_string()),
        }
    }
    (tags, bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> TagId {
        TagId::new(s).unwrap()
    }

    #[test]
    fn parses_and_canonicalizes() {
        let t = tag(" WA03 ");
        assert_eq!(t.to_string(), "wa3");
        assert_eq!(t.prefix(), "wa");
        assert_eq!(t.colour(), "w");
        assert_eq!(t.letter(), 'a');
        assert_eq!(t.number(), 3);
        assert_eq!(t.original(), " WA03 ");
    }

    #[test]
    fn multi_letter_colour() {
        let t = tag("bfa12");
        assert_eq!(t.colour(), "bf");
        assert_eq!(t.letter(), 'a');
        assert_eq!(t.full(), "bfa012");
    }

    #[test]
    fn zero_is_a_valid_number() {
        assert_eq!(tag("wa0").number(), 0);
        assert_eq!(tag("wa000").number(), 0);
    }

    #[test]
    fn rejects_malformed() {
        for raw in ["", "w3", "3wa", "wa", "wa-3", "wa3b", "w a3", "wa99999999999"] {
            assert!(TagId::new(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn equality_ignores_case_and_padding() {
        assert_eq!(tag("wa3"), tag("WA003"));
        assert_ne!(tag("wa3"), tag("wb3"));
    }

    #[test]
    fn orders_numerically_within_prefix() {
        assert!(tag("wa2") < tag("wa10"));
        assert!(tag("wa10") < tag("wb1"));
        let mut tags = vec![tag("wa10"), tag("bf1"), tag("wa2")];
        tags.sort();
        let names: Vec<String> = tags.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["bf1", "wa2", "wa10"]);
    }

    #[test]
    fn cased_display() {
        assert_eq!(tag("wa3").cased(true), "WA3");
        assert_eq!(tag("WA3").cased(false), "wa3");
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json::to_string(&tag("WA03")).unwrap();
        assert_eq!(json, "\"wa3\"");
        let parsed: TagId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tag("wa3"));
        assert!(serde_json::from_str::<TagId>("\"nope\"").is_err());
    }

    #[test]
    fn tag_list_splits_and_reports_bad_tokens() {
        let (tags, bad) = parse_tag_list("wa1 wa2,wb3  zz");
        assert_eq!(tags.len(), 3);
        assert_eq!(bad, vec!["zz".to_string()]);
    }
}
