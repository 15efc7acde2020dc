//! Per-tag lifecycle.
//!
//! Every change to a tag's status goes through [`TagStatus::transition`];
//! the `BikeTag` methods only add the time checks and visit bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::tag::TagId;
use crate::time::VTime;
use crate::types::BikeType;
use crate::visit::BikeVisit;

/// A rejected tag operation, carrying the value that conflicted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("tag {tag} is already checked in (at {time_in})")]
    AlreadyCheckedIn { tag: TagId, time_in: VTime },

    #[error("tag {tag} was already checked out (at {time_out})")]
    AlreadyCheckedOut { tag: TagId, time_out: VTime },

    #[error("tag {tag}: check-out {time_out} would be earlier than check-in {time_in}")]
    CheckoutBeforeCheckin {
        tag: TagId,
        time_in: VTime,
        time_out: VTime,
    },

    #[error("tag {tag} is retired")]
    Retired { tag: TagId },

    #[error("tag {tag} is not checked in")]
    NotCheckedIn { tag: TagId },

    #[error("tag {tag} is not checked out")]
    NotCheckedOut { tag: TagId },

    #[error("tag {tag} is in use and can't be retired")]
    InUse { tag: TagId },
}

/// Lifecycle state of a tag for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStatus {
    Unused,
    InUse,
    Done,
    Retired,
}

impl TagStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::InUse => "in_use",
            Self::Done => "done",
            Self::Retired => "retired",
        }
    }

    /// The status after `op`, or `None` if `op` isn't allowed from here.
    pub const fn transition(self, op: TagOp) -> Option<Self> {
        use TagOp::{CheckIn, CheckOut, DeleteIn, DeleteOut, EditIn, EditOut, Retire, Unretire};
        match (self, op) {
            (Self::Unused, CheckIn) | (Self::Done, DeleteOut) => Some(Self::InUse),
            (Self::InUse, CheckOut | EditOut) | (Self::Done, EditIn | EditOut) => {
                Some(Self::Done)
            }
            (Self::InUse, EditIn) => Some(Self::InUse),
            (Self::InUse, DeleteIn) | (Self::Retired, Unretire) => Some(Self::Unused),
            (Self::Unused | Self::Retired, Retire) => Some(Self::Retired),
            (Self::Unused, Unretire) => Some(Self::Unused),
            _ => None,
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operation that may change a tag's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    CheckIn,
    CheckOut,
    EditIn,
    EditOut,
    DeleteIn,
    DeleteOut,
    Retire,
    Unretire,
}

/// A tag's type, status and (at most one) visit for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BikeTag {
    tag: TagId,
    bike_type: BikeType,
    status: TagStatus,
    visit: Option<BikeVisit>,
}

impl BikeTag {
    pub const fn new(tag: TagId, bike_type: BikeType) -> Self {
        Self {
            tag,
            bike_type,
            status: TagStatus::Unused,
            visit: None,
        }
    }

    /// Rebuilds a tag from persisted visit data.
    ///
    /// The times are taken as given; inconsistencies are left for lint.
    pub fn restore(
        tag: TagId,
        bike_type: BikeType,
        time_in: VTime,
        time_out: Option<VTime>,
    ) -> Self {
        let status = if time_out.is_some() {
            TagStatus::Done
        } else {
            TagStatus::InUse
        };
        Self {
            visit: Some(BikeVisit {
                tag: tag.clone(),
                time_in,
                time_out,
            }),
            tag,
            bike_type,
            status,
        }
    }

    pub const fn tag(&self) -> &TagId {
        &self.tag
    }

    pub const fn bike_type(&self) -> BikeType {
        self.bike_type
    }

    pub(crate) const fn set_bike_type(&mut self, bike_type: BikeType) {
        self.bike_type = bike_type;
    }

    pub const fn status(&self) -> TagStatus {
        self.status
    }

    pub const fn visit(&self) -> Option<&BikeVisit> {
        self.visit.as_ref()
    }

    /// All of this tag's visits, oldest first.
    pub fn visits(&self) -> &[BikeVisit] {
        self.visit.as_slice()
    }

    pub fn time_in(&self) -> Option<VTime> {
        self.visit.as_ref().map(|v| v.time_in)
    }

    pub fn time_out(&self) -> Option<VTime> {
        self.visit.as_ref().and_then(|v| v.time_out)
    }

    /// Whether this tag has been used today.
    pub const fn is_used(&self) -> bool {
        matches!(self.status, TagStatus::InUse | TagStatus::Done)
    }

    fn conflict(&self, op: TagOp) -> TagError {
        let tag = self.tag.clone();
        match (self.status, self.time_in(), self.time_out()) {
            (TagStatus::Retired, ..) => TagError::Retired { tag },
            (TagStatus::InUse, Some(time_in), _) if op == TagOp::CheckIn => {
                TagError::AlreadyCheckedIn { tag, time_in }
            }
            (TagStatus::InUse, ..) if op == TagOp::Retire => TagError::InUse { tag },
            (TagStatus::InUse, ..) => TagError::NotCheckedOut { tag },
            (TagStatus::Done, _, Some(time_out)) => TagError::AlreadyCheckedOut { tag, time_out },
            _ => TagError::NotCheckedIn { tag },
        }
    }

    fn apply(&mut self, op: TagOp) -> Result<TagStatus, TagError> {
        let next = self.status.transition(op).ok_or_else(|| self.conflict(op))?;
        debug!(tag = %self.tag, from = %self.status, to = %next, ?op, "tag transition");
        Ok(next)
    }

    fn check_order(&self, time_in: VTime, time_out: VTime) -> Result<(), TagError> {
        if time_out < time_in {
            return Err(TagError::CheckoutBeforeCheckin {
                tag: self.tag.clone(),
                time_in,
                time_out,
            });
        }
        Ok(())
    }

    /// Starts a visit. Only an unused tag can be checked in.
    pub fn check_in(&mut self, time: VTime) -> Result<(), TagError> {
        self.status = self.apply(TagOp::CheckIn)?;
        self.visit = Some(BikeVisit::new(self.tag.clone(), time));
        Ok(())
    }

    /// Finishes the open visit. Leaves the tag untouched unless it is in use.
    pub fn check_out(&mut self, time: VTime) -> Result<(), TagError> {
        let next = self.apply(TagOp::CheckOut)?;
        let visit = self.visit.as_mut().ok_or_else(|| TagError::NotCheckedIn {
            tag: self.tag.clone(),
        })?;
        if time < visit.time_in {
            return Err(TagError::CheckoutBeforeCheckin {
                tag: self.tag.clone(),
                time_in: visit.time_in,
                time_out: time,
            });
        }
        visit.time_out = Some(time);
        self.status = next;
        Ok(())
    }

    /// Replaces the check-in time, keeping it no later than any check-out.
    pub fn edit_in(&mut self, time: VTime) -> Result<(), TagError> {
        let next = self.apply(TagOp::EditIn)?;
        if let Some(time_out) = self.time_out() {
            self.check_order(time, time_out)?;
        }
        if let Some(visit) = self.visit.as_mut() {
            visit.time_in = time;
        }
        self.status = next;
        Ok(())
    }

    /// Sets or replaces the check-out time, keeping it no earlier than check-in.
    pub fn edit_out(&mut self, time: VTime) -> Result<(), TagError> {
        let next = self.apply(TagOp::EditOut)?;
        let visit = self.visit.as_mut().ok_or_else(|| TagError::NotCheckedIn {
            tag: self.tag.clone(),
        })?;
        if time < visit.time_in {
            return Err(TagError::CheckoutBeforeCheckin {
                tag: self.tag.clone(),
                time_in: visit.time_in,
                time_out: time,
            });
        }
        visit.time_out = Some(time);
        self.status = next;
        Ok(())
    }

    /// Removes the visit of a tag that is in use.
    pub fn delete_in(&mut self) -> Result<(), TagError> {
        self.status = self.apply(TagOp::DeleteIn)?;
        self.visit = None;
        Ok(())
    }

    /// Clears the check-out of a finished visit, putting the tag back in use.
    pub fn delete_out(&mut self) -> Result<(), TagError> {
        self.status = self.apply(TagOp::DeleteOut)?;
        if let Some(visit) = self.visit.as_mut() {
            visit.time_out = None;
        }
        Ok(())
    }

    pub(crate) fn retire(&mut self) -> Result<(), TagError> {
        self.status = self.apply(TagOp::Retire)?;
        Ok(())
    }

    pub(crate) fn unretire(&mut self) -> Result<(), TagError> {
        self.status = self.apply(TagOp::Unretire)?;
        Ok(())
    }

    /// What the status was at `time`, reconstructed from the visit.
    pub fn status_as_at(&self, time: VTime) -> TagStatus {
        if self.status == TagStatus::Retired {
            return TagStatus::Retired;
        }
        match &self.visit {
            None => TagStatus::Unused,
            Some(v) if time < v.time_in => TagStatus::Unused,
            Some(BikeVisit {
                time_out: Some(out),
                ..
            }) if time >= *out => TagStatus::Done,
            Some(_) => TagStatus::InUse,
        }
    }

    /// Consistency problems between status and visit, as messages.
    pub fn lint_check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let tag = &self.tag;

        match (self.status, &self.visit) {
            (TagStatus::Unused | TagStatus::Retired, Some(_)) => {
                errors.push(format!("Tag {tag} has a visit but status is {}.", self.status));
            }
            (TagStatus::InUse | TagStatus::Done, None) => {
                errors.push(format!("Tag {tag} is {} but has no visit.", self.status));
            }
            (TagStatus::InUse, Some(v)) if v.time_out.is_some() => {
                errors.push(format!("Tag {tag} is in use but its visit is finished."));
            }
            (TagStatus::Done, Some(v)) if v.time_out.is_none() => {
                errors.push(format!("Tag {tag} is done but its visit is unfinished."));
            }
            _ => {}
        }

        if let Some(BikeVisit {
            time_in,
            time_out: Some(time_out),
            ..
        }) = &self.visit
        {
            if time_out < time_in {
                errors.push(format!(
                    "Tag {tag} has check-out {time_out} earlier than check-in {time_in}."
                ));
            }
        }

        errors
    }
}
