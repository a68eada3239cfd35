use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;
use varelim_core::HeuristicKind;

use crate::network_file::scalar_label;

const DEFAULT_RUN_ID: &str = "query";
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root query configuration, loaded from YAML and/or assembled from command-line flags.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryConfig {
    #[serde(default = "default_run_id")]
    pub run_id: String,
    /// Path of the network definition file.
    #[serde(default)]
    pub network: String,
    /// Query variable by name.
    #[serde(default)]
    pub query: Option<String>,
    /// Query variable by declaration position.
    #[serde(default)]
    pub query_index: Option<usize>,
    /// Observations keyed by variable name.
    #[serde(default)]
    pub evidence: BTreeMap<String, serde_yaml::Value>,
    /// Observations in `index,value;index,value` form.
    #[serde(default)]
    pub evidence_indexed: Option<String>,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            run_id: default_run_id(),
            network: String::new(),
            query: None,
            query_index: None,
            evidence: BTreeMap::new(),
            evidence_indexed: None,
            heuristic: HeuristicConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl QueryConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let cfg: QueryConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf,
            })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        if self.network.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "network".to_string(),
                message: "a network file must be specified".to_string(),
            });
        }
        match (&self.query, self.query_index) {
            (None, None) => {
                return Err(ValidationError::InvalidField {
                    field: "query".to_string(),
                    message: "a query variable must be specified".to_string(),
                });
            }
            (Some(_), Some(_)) => {
                return Err(ValidationError::InvalidField {
                    field: "query".to_string(),
                    message: "specify the query by name or by index, not both".to_string(),
                });
            }
            (Some(name), None) if name.trim().is_empty() => {
                return Err(ValidationError::InvalidField {
                    field: "query".to_string(),
                    message: "query name must not be empty".to_string(),
                });
            }
            _ => {}
        }
        for (name, value) in &self.evidence {
            if scalar_label(value).is_none() {
                return Err(ValidationError::InvalidField {
                    field: format!("evidence.{name}"),
                    message: "evidence value must be a scalar".to_string(),
                });
            }
        }
        if self.heuristic.seed.is_some() && self.heuristic.kind != HeuristicKind::Random {
            return Err(ValidationError::InvalidField {
                field: "heuristic.seed".to_string(),
                message: format!(
                    "a seed only applies to the random order, not {}",
                    self.heuristic.kind
                ),
            });
        }
        if let Some(json) = self.output.json.as_ref() {
            if json.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: "output.json".to_string(),
                    message: "path must not be empty".to_string(),
                });
            }
        }
        self.logging.normalize();
        if self.logging.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.logging.tracing_level),
            });
        }
        Ok(())
    }

    /// Evidence labels rendered as strings, in variable-name order.
    pub fn evidence_labels(&self) -> Vec<(String, String)> {
        self.evidence
            .iter()
            .filter_map(|(name, value)| scalar_label(value).map(|label| (name.clone(), label)))
            .collect()
    }

    /// Resolve the JSON output template (`{run_id}` placeholders) into a concrete path.
    pub fn resolved_json_output(&self) -> Option<PathBuf> {
        self.output
            .json
            .as_deref()
            .map(|template| resolve_template(&self.run_id, template))
    }
}

fn default_run_id() -> String {
    DEFAULT_RUN_ID.to_string()
}

/// Elimination-order selection.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HeuristicConfig {
    #[serde(default)]
    pub kind: HeuristicKind,
    /// Seed for the random order.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// What to print and where to write the JSON report.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub show_steps: bool,
    #[serde(default)]
    pub show_network: bool,
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self.log_dir.trim().is_empty() {
            self.log_dir = default_log_dir();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    ".".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
