//! Stay-length statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::blocks::BLOCK_MINUTES;
use crate::day::TrackerDay;
use crate::tag::TagId;
use crate::time::VTime;

/// Stay-length category boundaries, in hours.
pub const DEFAULT_VISIT_CATEGORIES: [f64; 2] = [1.5, 5.0];

/// Summary of how long bikes stayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayStats {
    pub count: usize,
    pub shortest: u16,
    pub shortest_tags: Vec<TagId>,
    pub longest: u16,
    pub longest_tags: Vec<TagId>,
    pub mean: f64,
    pub median: f64,
    /// Centres of the most common 30-minute buckets, shortest first.
    pub modes: Vec<u16>,
    pub mode_occurrences: usize,
}

/// Number of stays within `[lower, upper)` hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayCategory {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub count: usize,
}

impl StayCategory {
    pub fn label(&self) -> String {
        match (self.lower, self.upper) {
            (None, Some(upper)) => format!("< {upper:.1}h"),
            (Some(lower), None) => format!(">= {lower:.1}h"),
            (Some(lower), Some(upper)) => format!("{lower:.1}-{upper:.1}h"),
            (None, None) => "all".to_string(),
        }
    }
}

impl TrackerDay {
    /// Stay length in minutes for every visit started by `as_of`, with its tag.
    ///
    /// Bikes still on-site are measured to `as_of`, or treated as close of
    /// business once `as_of` reaches closing time.
    pub fn stay_lengths(&self, as_of: VTime) -> Vec<(TagId, u16)> {
        let close_of_business = self.time_closed.is_some_and(|closed| as_of >= closed);
        self.all_visits()
            .into_iter()
            .filter_map(|v| {
                v.duration(as_of, close_of_business)
                    .map(|d| (v.tag.clone(), d))
            })
            .collect()
    }
}

/// Mode buckets: centres of the most frequent `width`-minute buckets and
/// how often they occur.
pub fn modes(durations: &[u16], width: u16) -> (Vec<u16>, usize) {
    let mut buckets: BTreeMap<u16, usize> = BTreeMap::new();
    for d in durations {
        *buckets.entry(d / width * width).or_default() += 1;
    }
    let most = buckets.values().copied().max().unwrap_or(0);
    let centres = buckets
        .iter()
        .filter(|(_, count)| **count == most)
        .map(|(bucket, _)| bucket + width / 2)
        .collect();
    (centres, most)
}

fn median(sorted: &[u16]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    } else {
        f64::from(sorted[mid])
    }
}

/// Statistics over `(tag, minutes)` stays, or `None` if there are none.
pub fn stay_stats(stays: &[(TagId, u16)]) -> Option<StayStats> {
    let mut durations: Vec<u16> = stays.iter().map(|(_, d)| *d).collect();
    durations.sort_unstable();
    let shortest = *durations.first()?;
    let longest = *durations.last()?;

    let tags_with = |minutes: u16| -> Vec<TagId> {
        let mut tags: Vec<TagId> = stays
            .iter()
            .filter(|(_, d)| *d == minutes)
            .map(|(t, _)| t.clone())
            .collect();
        tags.sort();
        tags
    };

    let total: f64 = durations.iter().map(|d| f64::from(*d)).sum();
    #[expect(clippy::cast_precision_loss, reason = "a day has a few hundred stays")]
    let mean = total / durations.len() as f64;
    let (modes, mode_occurrences) = modes(&durations, BLOCK_MINUTES);

    Some(StayStats {
        count: durations.len(),
        shortest,
        shortest_tags: tags_with(shortest),
        longest,
        longest_tags: tags_with(longest),
        mean,
        median: median(&durations),
        modes,
        mode_occurrences,
    })
}

/// Counts stays falling between consecutive hour boundaries.
///
/// With boundaries `[1.5, 5.0]` the categories are under 1.5 h,
/// 1.5 h to under 5 h, and 5 h or more.
pub fn stay_categories(durations: &[u16], boundaries: &[f64]) -> Vec<StayCategory> {
    let mut edges: Vec<Option<f64>> = vec![None];
    edges.extend(boundaries.iter().copied().map(Some));
    edges.push(None);

    edges
        .windows(2)
        .map(|pair| {
            let (lower, upper) = (pair[0], pair[1]);
            let count = durations
                .iter()
                .map(|d| f64::from(*d))
                .filter(|d| lower.is_none_or(|h| *d >= h * 60.0))
                .filter(|d| upper.is_none_or(|h| *d < h * 60.0))
                .count();
            StayCategory { lower, upper, count }
        })
        .collect()
}
