//! Bike valet CLI library.
//!
//! This crate provides the command-line interface for the tag tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DeleteArg, EventArg};
pub use config::{Config, TagLists};
