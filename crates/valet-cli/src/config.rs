//! Configuration loading and management.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use valet_core::audit::DEFAULT_BUSIEST_RANKS;
use valet_core::stats::DEFAULT_VISIT_CATEGORIES;
use valet_core::{TagId, VTime, parse_tag_list};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding one datafile per day.
    pub data_dir: PathBuf,
    /// Database path; defaults to `valet.db` in `data_dir`.
    pub database_path: Option<PathBuf>,
    /// Datafile names are `<prefix><YYYY-MM-DD>.dat`.
    pub datafile_prefix: String,
    pub regular_tags: String,
    pub oversize_tags: String,
    pub retired_tags: String,
    /// Default hours for a fresh day.
    pub time_open: Option<String>,
    pub time_closed: Option<String>,
    pub uppercase_tags: bool,
    pub busiest_ranks: usize,
    /// Stay-length category boundaries, in hours.
    pub visit_categories: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            database_path: None,
            datafile_prefix: "valet_".to_string(),
            regular_tags: String::new(),
            oversize_tags: String::new(),
            retired_tags: String::new(),
            time_open: None,
            time_closed: None,
            uppercase_tags: false,
            busiest_ranks: DEFAULT_BUSIEST_RANKS,
            visit_categories: DEFAULT_VISIT_CATEGORIES.to_vec(),
        }
    }
}

/// The three tag lists, parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagLists {
    pub regular: BTreeSet<TagId>,
    pub oversize: BTreeSet<TagId>,
    pub retired: BTreeSet<TagId>,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // VALET_* environment variables
        figment = figment.merge(Env::prefixed("VALET_"));

        figment.extract()
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("valet.db"))
    }

    /// Parsed tag lists, or `None` if no regular or oversize tags are configured.
    pub fn tag_lists(&self) -> Result<Option<TagLists>> {
        if self.regular_tags.trim().is_empty() && self.oversize_tags.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(TagLists {
            regular: parse_list("regular_tags", &self.regular_tags)?,
            oversize: parse_list("oversize_tags", &self.oversize_tags)?,
            retired: parse_list("retired_tags", &self.retired_tags)?,
        }))
    }

    /// Default opening and closing times.
    pub fn hours(&self) -> Result<(Option<VTime>, Option<VTime>)> {
        let parse = |key: &str, value: Option<&String>| {
            value
                .map(|v| VTime::parse(v).with_context(|| format!("invalid {key} in configuration")))
                .transpose()
        };
        Ok((
            parse("time_open", self.time_open.as_ref())?,
            parse("time_closed", self.time_closed.as_ref())?,
        ))
    }
}

fn parse_list(key: &str, raw: &str) -> Result<BTreeSet<TagId>> {
    let (tags, bad) = parse_tag_list(raw);
    if !bad.is_empty() {
        anyhow::bail!("invalid tags in {key}: {}", bad.join(", "));
    }
    Ok(tags.into_iter().collect())
}

/// Returns the platform-specific config directory for valet.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("valet"))
}

/// Returns the platform-specific data directory for valet.
///
/// On Linux: `~/.local/share/valet`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("valet"))
}
