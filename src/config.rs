//! Processing configuration.
//!
//! The filter policy lives in the `[processing]` table of the service
//! configuration file:
//!
//! ```toml
//! [processing]
//! filter_allowed_clusters = true
//! allowed_clusters = ["5d5892d3-1f74-4ccf-91af-548dfc9767aa"]
//! filter_blocked_clusters = false
//! blocked_clusters = []
//! ```
//!
//! Every key is optional. Missing flags are `false` and missing lists are
//! empty, so an absent table disables filtering entirely.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Filter policy for one filtering call
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfiguration {
    /// Keep only clusters listed in `allowed_clusters`.
    pub filter_allowed_clusters: bool,

    /// Drop clusters listed in `blocked_clusters`.
    pub filter_blocked_clusters: bool,

    pub allowed_clusters: Vec<String>,

    pub blocked_clusters: Vec<String>,
}

impl ProcessingConfiguration {
    /// Load the `[processing]` table from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = data.parse()?;

        debug!(
            path = %path.display(),
            allow = config.filter_allowed_clusters,
            block = config.filter_blocked_clusters,
            allowed = config.allowed_clusters.len(),
            blocked = config.blocked_clusters.len(),
            "loaded processing configuration"
        );

        Ok(config)
    }

    /// Enable allow-list mode and append `names` to the allow-list
    pub fn allow(&mut self, names: impl IntoIterator<Item = String>) {
        self.filter_allowed_clusters = true;
        self.allowed_clusters.extend(names);
    }

    /// Enable block-list mode and append `names` to the block-list
    pub fn block(&mut self, names: impl IntoIterator<Item = String>) {
        self.filter_blocked_clusters = true;
        self.blocked_clusters.extend(names);
    }

    /// True when at least one filter mode is enabled
    pub fn is_filtering(&self) -> bool {
        self.filter_allowed_clusters || self.filter_blocked_clusters
    }
}

#[derive(Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    processing: ProcessingConfiguration,
}

impl FromStr for ProcessingConfiguration {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let file: ConfigFile = toml::from_str(data)?;
        Ok(file.processing)
    }
}

/// Read cluster list from file (one cluster name per line, supports comments with #)
///
/// Names keep the order they first appear in; repeated names are dropped.
pub fn read_cluster_list(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let to_error = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_error)?;
    let reader = BufReader::new(file);
    let mut seen = rustc_hash::FxHashSet::default();
    let mut clusters = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(to_error)?;
        let name = line.trim();
        // Skip empty lines and comments
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        if seen.insert(name.to_string()) {
            clusters.push(name.to_string());
        }
    }

    debug!(path = %path.display(), count = clusters.len(), "read cluster list");
    Ok(clusters)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration or list file.
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),
}
