//! Moment derivation.
//!
//! A moment is an instant at which at least one bike came or went. Moments
//! are rebuilt from the day's visits on every call, so edits and deletes are
//! always reflected without any cache to invalidate.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::day::TrackerDay;
use crate::tag::TagId;
use crate::time::VTime;
use crate::types::{BikeType, Tally};

/// What happened at one instant, and what was on-site right after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Moment {
    pub time: VTime,
    pub checked_in: Vec<TagId>,
    pub checked_out: Vec<TagId>,
    pub bikes_in: Tally,
    pub bikes_out: Tally,
    pub on_hand: Tally,
    /// Tags on-site once this moment's events are applied, in tag order.
    pub on_site: Vec<TagId>,
}

#[derive(Default)]
struct Events {
    ins: Vec<(TagId, BikeType)>,
    outs: Vec<(TagId, BikeType)>,
}

impl TrackerDay {
    /// The cutoff used when none is given: the day's latest event, else now.
    pub fn default_cutoff(&self) -> VTime {
        self.latest_event(VTime::END_OF_DAY)
            .unwrap_or_else(VTime::now)
    }

    /// Time-ordered moments up to and including `as_of`.
    ///
    /// At an instant with both check-ins and check-outs, the check-ins are
    /// counted first.
    pub fn moments(&self, as_of: Option<VTime>) -> Vec<Moment> {
        let cutoff = as_of.unwrap_or_else(|| self.default_cutoff());

        let mut by_time: BTreeMap<VTime, Events> = BTreeMap::new();
        for biketag in self.biketags() {
            for visit in biketag.visits() {
                let entry = (biketag.tag().clone(), biketag.bike_type());
                if visit.time_in <= cutoff {
                    by_time
                        .entry(visit.time_in)
                        .or_default()
                        .ins
                        .push(entry.clone());
                }
                if let Some(out) = visit.time_out.filter(|t| *t <= cutoff) {
                    by_time.entry(out).or_default().outs.push(entry);
                }
            }
        }

        let mut on_hand = Tally::default();
        let mut on_site: BTreeSet<TagId> = BTreeSet::new();
        let mut moments = Vec::with_capacity(by_time.len());

        for (time, events) in by_time {
            let mut bikes_in = Tally::default();
            let mut bikes_out = Tally::default();
            for (tag, bike_type) in &events.ins {
                bikes_in.add(*bike_type);
                on_hand.add(*bike_type);
                on_site.insert(tag.clone());
            }
            for (tag, bike_type) in &events.outs {
                bikes_out.add(*bike_type);
                on_hand.remove(*bike_type);
                on_site.remove(tag);
            }
            moments.push(Moment {
                time,
                checked_in: events.ins.into_iter().map(|(t, _)| t).collect(),
                checked_out: events.outs.into_iter().map(|(t, _)| t).collect(),
                bikes_in,
                bikes_out,
                on_hand,
                on_site: on_site.iter().cloned().collect(),
            });
        }

        debug!(%cutoff, moments = moments.len(), "derived moments");
        moments
    }
}
