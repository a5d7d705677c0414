//! Configuration for replay batches.
//!
//! ```yaml
//! batches:
//!   nightly:
//!     input: "${SPOOL_DIR:-/var/spool/archivist}/nightly.ndjson"
//!     unrecoverable_reasons: [quota_exceeded]
//! report:
//!   format: ndjson
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use archivist_core::config::{ConfigPath, Mergeable, interpolate, load_from_paths};
use archivist_core::error::ConfigError;

use crate::issues::{ReasonKey, ReportFormat};

/// Name of a configured batch.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchKey(String);

impl BatchKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One failure log to replay into its own accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// NDJSON file of failure entries.
    pub input: PathBuf,
    /// Reasons forced to non-recoverable regardless of what the log says.
    #[serde(default)]
    pub unrecoverable_reasons: Vec<ReasonKey>,
}

/// Report rendering options. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

impl ReportConfig {
    pub fn format(&self) -> ReportFormat {
        self.format.unwrap_or_default()
    }

    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(false)
    }

    /// Merge values from another ReportConfig: any value set in `other` wins.
    pub fn merge_from(&mut self, other: &Self) {
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.pretty.is_some() {
            self.pretty = other.pretty;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub batches: IndexMap<BatchKey, BatchConfig>,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Interpolate environment variables, then parse and validate a single
    /// YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let result = interpolate(contents);
        if !result.is_ok() {
            return Err(ConfigError::EnvInterpolation {
                message: result.errors.join("\n"),
            });
        }
        Self::parse(&result.text)
    }

    /// Parse and validate already-interpolated YAML.
    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|source| ConfigError::YamlParse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Load, merge, and validate every config source.
    pub fn from_paths(paths: &[ConfigPath]) -> Result<Self, ConfigError> {
        let config: Self = load_from_paths(paths)?;
        if config.batches.is_empty() {
            return Err(ConfigError::NoBatches);
        }
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_paths(&[ConfigPath::file(path.as_ref())])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, batch) in &self.batches {
            if batch.input.as_os_str().is_empty() {
                return Err(ConfigError::EmptyInputPath {
                    batch: key.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn batches(&self) -> impl Iterator<Item = (&BatchKey, &BatchConfig)> {
        self.batches.iter()
    }
}

impl Mergeable for Config {
    type Key = BatchKey;
    type Component = BatchConfig;

    fn components_mut(&mut self) -> &mut IndexMap<BatchKey, BatchConfig> {
        &mut self.batches
    }

    fn parse_yaml(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents)
    }

    fn merge_settings(&mut self, other: &Self) {
        self.report.merge_from(&other.report);
    }
}
