//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use valet_core::{DeleteWhat, InOut};

/// Bike valet tag tracker.
///
/// Records bikes checked in and out against numbered tags, one datafile per
/// day, and reports on the day's activity.
#[derive(Debug, Parser)]
#[command(name = "valet", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Day to work on (YYYY-MM-DD); defaults to today.
    #[arg(short, long, global = true, conflicts_with = "file")]
    pub date: Option<NaiveDate>,

    /// Datafile to work on instead of the one for `--date`.
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a new day's datafile from the configured tag lists and hours.
    Init,

    /// Check a bike in.
    In {
        tag: String,
        /// Time of check-in (HH:MM or "now").
        #[arg(default_value = "now")]
        time: String,
    },

    /// Check a bike out.
    Out {
        tag: String,
        /// Time of check-out (HH:MM or "now").
        #[arg(default_value = "now")]
        time: String,
    },

    /// Change a recorded check-in or check-out time.
    Edit {
        tag: String,
        which: EventArg,
        time: String,
    },

    /// Delete a visit, or just its check-out.
    Delete { tag: String, what: DeleteArg },

    /// Show the state of one or more tags.
    Query {
        #[arg(required = true)]
        tags: Vec<String>,
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Check the day's datafile for consistency.
    Lint {
        /// Also require date and operating hours.
        #[arg(long)]
        strict: bool,
    },

    /// Take an unused tag out of service for the day.
    Retire { tag: String },

    /// Return a retired tag to service.
    Unretire { tag: String },

    /// Show or change the count of bike registrations (+N, -N or N).
    Registrations {
        #[arg(allow_hyphen_values = true)]
        change: Option<String>,
    },

    /// Show or set today's operating hours.
    Hours {
        #[arg(requires = "closed")]
        open: Option<String>,
        closed: Option<String>,
    },

    /// Add a note to the day.
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show bikes on hand, for checking against the tags on the rack.
    Audit {
        #[arg(long)]
        as_of: Option<String>,
        /// Day-end leftover count to reconcile against.
        #[arg(long)]
        leftover: Option<usize>,
        /// Also show tags already returned.
        #[arg(long)]
        returns: bool,
    },

    /// Summarize the day.
    Report {
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Activity by half-hour block.
    Blocks {
        #[arg(long)]
        as_of: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Every instant a bike came or went.
    Moments {
        #[arg(long)]
        as_of: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Store the day's summary and visits in the database.
    Publish {
        /// Day-end leftover count to reconcile against.
        #[arg(long)]
        leftover: Option<usize>,
        /// Precipitation, in mm.
        #[arg(long)]
        precipitation: Option<f64>,
        /// Temperature, in degrees C.
        #[arg(long)]
        temperature: Option<f64>,
    },

    /// List published days.
    History {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventArg {
    In,
    Out,
}

impl From<EventArg> for InOut {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::In => Self::In,
            EventArg::Out => Self::Out,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeleteArg {
    Both,
    Out,
}

impl From<DeleteArg> for DeleteWhat {
    fn from(arg: DeleteArg) -> Self {
        match arg {
            DeleteArg::Both => Self::Both,
            DeleteArg::Out => Self::Out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_edit() {
        let cli = Cli::try_parse_from(["valet", "--date", "2024-06-01", "edit", "wa3", "out", "9:45"])
            .unwrap();
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 6, 1));
        let Some(Commands::Edit { tag, which, time }) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!((tag.as_str(), which, time.as_str()), ("wa3", EventArg::Out, "9:45"));
    }

    #[test]
    fn time_defaults_to_now() {
        let cli = Cli::try_parse_from(["valet", "in", "wa3"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::In { time, .. }) if time == "now"));
    }

    #[test]
    fn registration_change_may_be_negative() {
        let cli = Cli::try_parse_from(["valet", "registrations", "-2"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Registrations { change: Some(c) }) if c == "-2"));
        let cli = Cli::try_parse_from(["valet", "registrations"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Registrations { change: None })));
    }

    #[test]
    fn hours_need_both_times() {
        assert!(Cli::try_parse_from(["valet", "hours", "8:00"]).is_err());
        let cli = Cli::try_parse_from(["valet", "hours", "8:00", "17:30"]).unwrap();
        let Some(Commands::Hours { open, closed }) = cli.command else {
            panic!("expected hours");
        };
        assert_eq!((open.as_deref(), closed.as_deref()), (Some("8:00"), Some("17:30")));
    }

    #[test]
    fn date_and_file_conflict() {
        assert!(Cli::try_parse_from(["valet", "-d", "2024-06-01", "-f", "x.dat", "lint"]).is_err());
    }
}
