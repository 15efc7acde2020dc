//! CLI subcommand implementations.

pub mod audit;
pub mod init;
pub mod note;
pub mod publish;
pub mod report;
pub mod settings;
pub mod tags;
pub mod track;
pub mod util;
