//! Fixed-width time blocks built from moments.

use serde::Serialize;
use tracing::debug;

use crate::day::TrackerDay;
use crate::moments::Moment;
use crate::tag::TagId;
use crate::time::VTime;
use crate::types::Tally;

/// Width of a reporting block, in minutes.
pub const BLOCK_MINUTES: u16 = 30;

/// Activity in one 30-minute window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub start: VTime,
    pub ins: Vec<TagId>,
    pub outs: Vec<TagId>,
    pub num_in: Tally,
    pub num_out: Tally,
    /// Check-ins since the start of the day, through this block.
    pub so_far: Tally,
    /// On-hand at the end of this block.
    pub full: Tally,
    /// Most bikes on-site at any instant within the block.
    pub fullest: usize,
    pub fullest_at: VTime,
    pub fullest_tags: Vec<TagId>,
}

impl Block {
    pub fn end(&self) -> VTime {
        self.start.plus(BLOCK_MINUTES - 1)
    }

    /// Check-ins plus check-outs.
    pub const fn activity(&self) -> usize {
        self.num_in.total + self.num_out.total
    }
}

/// Start of the block holding `time`. `24:00` falls in the day's last block.
fn block_for(time: VTime) -> VTime {
    time.min(VTime::LAST_MINUTE).block_start(BLOCK_MINUTES)
}

/// Groups moments into consecutive blocks, from the block holding the first
/// moment through the block holding `cutoff`.
pub fn aggregate(moments: &[Moment], cutoff: VTime) -> Vec<Block> {
    let Some(first) = moments.first() else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut so_far = Tally::default();
    let mut outs_so_far = Tally::default();
    let mut on_site: Vec<TagId> = Vec::new();
    let mut remaining = moments.iter().peekable();

    let last_start = block_for(cutoff.max(first.time));
    let mut start = block_for(first.time);
    loop {
        let at_start = so_far.saturating_sub(outs_so_far).total;
        let mut block = Block {
            start,
            ins: Vec::new(),
            outs: Vec::new(),
            num_in: Tally::default(),
            num_out: Tally::default(),
            so_far,
            full: Tally::default(),
            fullest: at_start,
            fullest_at: start,
            fullest_tags: on_site.clone(),
        };

        while let Some(moment) = remaining.next_if(|m| block_for(m.time) == start) {
            block.ins.extend(moment.checked_in.iter().cloned());
            block.outs.extend(moment.checked_out.iter().cloned());
            block.num_in += moment.bikes_in;
            block.num_out += moment.bikes_out;
            if moment.on_hand.total > block.fullest {
                block.fullest = moment.on_hand.total;
                block.fullest_at = moment.time;
                block.fullest_tags.clone_from(&moment.on_site);
            }
            on_site.clone_from(&moment.on_site);
        }

        so_far += block.num_in;
        outs_so_far += block.num_out;
        block.so_far = so_far;
        block.full = so_far.saturating_sub(outs_so_far);
        blocks.push(block);

        if start >= last_start {
            break;
        }
        start = start.plus(BLOCK_MINUTES);
    }

    debug!(blocks = blocks.len(), "aggregated blocks");
    blocks
}

impl TrackerDay {
    /// 30-minute blocks up to `as_of` (default: the day's latest event).
    pub fn blocks(&self, as_of: Option<VTime>) -> Vec<Block> {
        let cutoff = as_of.unwrap_or_else(|| self.default_cutoff());
        aggregate(&self.moments(Some(cutoff)), cutoff)
    }
}
