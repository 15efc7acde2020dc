//! Core domain logic for the bike valet tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Tags and times: validated, canonical `TagId` and `VTime` values
//! - Tag lifecycle: the check-in/check-out/edit/delete state machine
//! - The day: tag lists, per-tag state and consistency checking (lint)
//! - Derived views: moments, 30-minute blocks, audits and statistics
//! - The datafile text format a day is persisted in

pub mod audit;
mod biketag;
pub mod blocks;
pub mod datafile;
mod day;
mod moments;
pub mod stats;
mod tag;
mod time;
pub mod types;
mod visit;

pub use audit::{BusyRank, DayTotals, HighWaterMark, InOutSummary, LeftoverCheck, TagMatrix};
pub use biketag::{BikeTag, TagError, TagOp, TagStatus};
pub use blocks::{BLOCK_MINUTES, Block};
pub use datafile::DatafileError;
pub use day::{
    DayConfig, DayError, DeleteWhat, InOut, RegistrationChange, TagQuery, TrackerDay,
};
pub use moments::Moment;
pub use stats::{StayCategory, StayStats};
pub use tag::{TagId, parse_tag_list};
pub use time::{MINUTES_PER_DAY, VTime, format_minutes};
pub use types::{BikeType, Category, Tally, ValidationError};
pub use visit::BikeVisit;
