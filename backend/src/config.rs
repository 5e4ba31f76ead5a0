//! Explicit configuration values for the benchmark drivers and the reaper.
//!
//! Everything is a constant except the home directory (needed to locate
//! `~/.siege/siege.conf`) and the optional listing source for the reaper.
//! Environment access is confined to the `from_env` constructors so the
//! operations themselves can be driven with plain values.

use crate::types::OpsError;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const SIEGE_DIR_NAME: &str = ".siege";
pub const SIEGE_CONF_NAME: &str = "siege.conf";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_QUERY: &str = "/?q=word";
pub const DEFAULT_CONCURRENCY: u32 = 1000;
pub const TUNED_CONCURRENCY: u32 = 255;
pub const DEFAULT_DURATION: &str = "1M";

/// Substring identifying word_finder master and worker processes.
pub const WORD_FINDER_MARKER: &str = "word_finder";

/// Settings for one siege benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub conf_dir: PathBuf,
    pub conf_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub query: String,
    pub concurrency: u32,
    /// Passed verbatim to `siege -t`, e.g. `1M` or `30S`.
    pub duration: String,
}

impl BenchConfig {
    /// Builds the default benchmark settings rooted at `home`.
    pub fn for_home(home: impl AsRef<Path>) -> Self {
        let conf_dir = home.as_ref().join(SIEGE_DIR_NAME);
        let conf_path = conf_dir.join(SIEGE_CONF_NAME);
        Self {
            conf_dir,
            conf_path,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            query: DEFAULT_QUERY.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            duration: DEFAULT_DURATION.to_string(),
        }
    }

    /// Reads `HOME` and builds the default settings from it.
    pub fn from_env() -> Result<Self, OpsError> {
        match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => Ok(Self::for_home(PathBuf::from(home))),
            _ => Err(OpsError::MissingHome),
        }
    }

    /// Same target, with concurrency lowered to match the tuned siege.conf.
    pub fn tuned(mut self) -> Self {
        self.concurrency = TUNED_CONCURRENCY;
        self
    }

    /// `host:port/query` as siege expects it on the command line.
    pub fn target_url(&self) -> String {
        format!("{}:{}{}", self.host, self.port, self.query)
    }
}

/// Where the reaper takes its process snapshot from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSource {
    /// `ps -A`
    #[default]
    Ps,
    /// `/proc`, read directly.
    Procfs,
}

impl ListingSource {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ps" => Some(ListingSource::Ps),
            "procfs" | "proc" => Some(ListingSource::Procfs),
            _ => None,
        }
    }
}

/// Settings for one reaper run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapConfig {
    pub marker: String,
    pub source: ListingSource,
}

impl Default for ReapConfig {
    fn default() -> Self {
        Self {
            marker: WORD_FINDER_MARKER.to_string(),
            source: ListingSource::default(),
        }
    }
}

impl ReapConfig {
    /// Reads the optional `REAPER_SOURCE` override (`ps` or `procfs`).
    pub fn from_env() -> Self {
        Self::with_source_override(std::env::var("REAPER_SOURCE").ok().as_deref())
    }

    fn with_source_override(value: Option<&str>) -> Self {
        let mut cfg = Self::default();
        if let Some(raw) = value {
            match ListingSource::parse(raw) {
                Some(source) => cfg.source = source,
                None => warn!(value = raw, "unknown REAPER_SOURCE, using ps"),
            }
        }
        cfg
    }
}
