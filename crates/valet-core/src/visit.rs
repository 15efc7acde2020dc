//! A single stay of one bike.

use serde::{Deserialize, Serialize};

use crate::tag::TagId;
use crate::time::VTime;

/// Minimum stay assumed for a bike still on-site at close of business.
const CLOSE_OF_BUSINESS_BUFFER: u16 = 30;

/// One check-in/check-out pair for a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeVisit {
    pub tag: TagId,
    pub time_in: VTime,
    /// `None` while the bike is still on-site.
    pub time_out: Option<VTime>,
}

impl BikeVisit {
    pub const fn new(tag: TagId, time_in: VTime) -> Self {
        Self {
            tag,
            time_in,
            time_out: None,
        }
    }

    pub const fn is_open(&self) -> bool {
        self.time_out.is_none()
    }

    /// Minutes on-site as of `as_of`, or `None` if the visit hasn't started.
    ///
    /// Normally an open visit (or one that ends after `as_of`) is measured
    /// to `as_of`. At close of business an open visit is instead measured to
    /// `as_of` or half an hour after check-in, whichever is later, and a
    /// recorded check-out is used as-is.
    pub fn duration(&self, as_of: VTime, close_of_business: bool) -> Option<u16> {
        if self.time_in > as_of {
            return None;
        }

        let end = if close_of_business {
            self.time_out
                .unwrap_or_else(|| as_of.max(self.time_in.plus(CLOSE_OF_BUSINESS_BUFFER)))
        } else {
            self.time_out.map_or(as_of, |out| out.min(as_of))
        };

        Some(end.minutes().saturating_sub(self.time_in.minutes()))
    }
}
