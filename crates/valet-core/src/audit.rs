//! Audit and end-of-day reporting over moments and blocks.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::blocks::Block;
use crate::biketag::TagStatus;
use crate::day::TrackerDay;
use crate::moments::Moment;
use crate::tag::TagId;
use crate::time::VTime;
use crate::types::{Category, Tally};

/// How many ranks the busiest-times report shows by default.
pub const DEFAULT_BUSIEST_RANKS: usize = 4;

const RETIRED_CELL: &str = " ●";
const EMPTY_CELL: &str = "  ";

/// One slot of a tag matrix row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixCell {
    Present(u32),
    Retired,
    Empty,
}

impl MatrixCell {
    fn render(self) -> String {
        match self {
            Self::Present(n) => format!("{n:02}"),
            Self::Retired => RETIRED_CELL.to_string(),
            Self::Empty => EMPTY_CELL.to_string(),
        }
    }
}

/// One prefix's tags, from number 0 through the highest listed number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub prefix: String,
    pub cells: Vec<MatrixCell>,
}

/// Tags grouped by prefix and laid out by number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagMatrix {
    pub rows: Vec<MatrixRow>,
}

impl TagMatrix {
    /// Lays out `selected` against the day's tag lists.
    ///
    /// Only prefixes with at least one selected tag get a row.
    pub fn build<'a>(day: &TrackerDay, selected: impl IntoIterator<Item = &'a TagId>) -> Self {
        let mut by_prefix: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
        for tag in selected {
            by_prefix.entry(tag.prefix()).or_default().insert(tag.number());
        }

        let rows = by_prefix
            .into_iter()
            .map(|(prefix, numbers)| {
                let greatest = day
                    .regular_tags()
                    .iter()
                    .chain(day.oversize_tags())
                    .filter(|t| t.prefix() == prefix)
                    .map(TagId::number)
                    .chain(numbers.iter().copied())
                    .max()
                    .unwrap_or(0);
                let cells = (0..=greatest)
                    .map(|n| {
                        if numbers.contains(&n) {
                            MatrixCell::Present(n)
                        } else if day
                            .retired_tags()
                            .iter()
                            .any(|t| t.prefix() == prefix && t.number() == n)
                        {
                            MatrixCell::Retired
                        } else {
                            MatrixCell::Empty
                        }
                    })
                    .collect();
                MatrixRow {
                    prefix: prefix.to_string(),
                    cells,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One text line per row, two columns per tag number.
    pub fn render(&self, uppercase: bool) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let prefix = if uppercase {
                    row.prefix.to_ascii_uppercase()
                } else {
                    row.prefix.clone()
                };
                let mut line = format!("{prefix} ");
                for cell in &row.cells {
                    line.push(' ');
                    line.push_str(&cell.render());
                }
                line.trim_end().to_string()
            })
            .collect()
    }
}

/// Bikes in, returned and still on-site as of a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InOutSummary {
    pub checked_in: Tally,
    pub returned: Tally,
    pub on_site: Tally,
}

/// The day maximum of one category and when it was first reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighWaterMark {
    pub category: Category,
    pub count: usize,
    pub at: Option<VTime>,
}

/// Blocks sharing one activity level in the busiest-times ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusyRank {
    pub rank: usize,
    pub activity: usize,
    pub starts: Vec<VTime>,
}

/// Whole-day totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub parked: Tally,
    pub leftover: Tally,
    pub fullest: Vec<HighWaterMark>,
}

/// Recorded leftovers compared against the operator's day-end count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeftoverCheck {
    pub recorded: usize,
    pub reported: usize,
}

impl LeftoverCheck {
    pub const fn matches(&self) -> bool {
        self.recorded == self.reported
    }

    pub fn discrepancy(&self) -> Option<String> {
        (!self.matches()).then(|| {
            format!(
                "{} bikes recorded as left over but {} reported.",
                self.recorded, self.reported
            )
        })
    }
}

/// First time each category reached its day maximum.
pub fn highwater(moments: &[Moment]) -> Vec<HighWaterMark> {
    Category::ALL
        .iter()
        .map(|&category| {
            let mut mark = HighWaterMark {
                category,
                count: 0,
                at: None,
            };
            for moment in moments {
                let count = moment.on_hand.get(category);
                if count > mark.count {
                    mark.count = count;
                    mark.at = Some(moment.time);
                }
            }
            mark
        })
        .collect()
}

/// Ranks blocks by check-ins plus check-outs, ties grouped together.
///
/// Blocks with no activity are not ranked.
pub fn busiest(blocks: &[Block], ranks: usize) -> Vec<BusyRank> {
    let mut by_activity: BTreeMap<usize, Vec<VTime>> = BTreeMap::new();
    for block in blocks.iter().filter(|b| b.activity() > 0) {
        by_activity.entry(block.activity()).or_default().push(block.start);
    }
    by_activity
        .into_iter()
        .rev()
        .take(ranks)
        .enumerate()
        .map(|(i, (activity, starts))| BusyRank {
            rank: i + 1,
            activity,
            starts,
        })
        .collect()
}

impl TrackerDay {
    /// Tags with a bike on-site at `as_of`.
    pub fn on_hand_matrix(&self, as_of: VTime) -> TagMatrix {
        TagMatrix::build(self, self.tags_in_use(as_of))
    }

    /// Tags whose bike had been returned by `as_of`.
    pub fn returned_matrix(&self, as_of: VTime) -> TagMatrix {
        TagMatrix::build(self, self.tags_done(as_of))
    }

    pub fn inout_summary(&self, as_of: VTime) -> InOutSummary {
        let mut checked_in = Tally::default();
        let mut returned = Tally::default();
        for biketag in self.biketags() {
            match biketag.status_as_at(as_of) {
                TagStatus::InUse => checked_in.add(biketag.bike_type()),
                TagStatus::Done => {
                    checked_in.add(biketag.bike_type());
                    returned.add(biketag.bike_type());
                }
                TagStatus::Unused | TagStatus::Retired => {}
            }
        }
        InOutSummary {
            checked_in,
            returned,
            on_site: checked_in.saturating_sub(returned),
        }
    }

    pub fn reconcile_leftovers(&self, as_of: VTime, reported: usize) -> LeftoverCheck {
        LeftoverCheck {
            recorded: self.tags_in_use(as_of).len(),
            reported,
        }
    }

    /// Parked, left-over and fullest figures for the day through `as_of`.
    pub fn day_totals(&self, as_of: Option<VTime>) -> DayTotals {
        let cutoff = as_of.unwrap_or_else(|| self.default_cutoff());
        let moments = self.moments(Some(cutoff));
        let blocks = crate::blocks::aggregate(&moments, cutoff);
        let last = blocks.last();
        DayTotals {
            parked: last.map(|b| b.so_far).unwrap_or_default(),
            leftover: last.map(|b| b.full).unwrap_or_default(),
            fullest: highwater(&moments),
        }
    }
}
