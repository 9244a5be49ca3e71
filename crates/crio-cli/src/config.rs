//! Configuration file handling for the crio CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crio_client::{BackendConfig, ClientConfig};
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Endpoint used when neither the command line nor the config file names one
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8001";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default controller webserver URL
    pub endpoint: Option<String>,
    /// Replay snapshot to use instead of a live controller
    pub replay: Option<PathBuf>,
    /// Request timeout in seconds; 0 disables it
    pub timeout_secs: Option<u64>,
    /// Default output format
    pub output: Option<OutputFormat>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

/// Command-line values that override the config file
#[derive(Debug, Clone, Default)]
pub struct ArgOverrides {
    pub endpoint: Option<String>,
    pub replay: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub output: Option<OutputFormat>,
    pub no_color: bool,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("crio-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    ///
    /// An endpoint or replay file given on the command line beats both
    /// settings from the file; `--replay` wins over `--endpoint`.
    pub fn merge_with_args(&self, args: &ArgOverrides) -> MergedConfig {
        let timeout_secs = args.timeout_secs.or(self.timeout_secs);

        let backend = match (&args.replay, &args.endpoint) {
            (Some(file), _) => BackendConfig::replay(file),
            (None, Some(endpoint)) => http_backend(endpoint, timeout_secs),
            (None, None) => match (&self.replay, &self.endpoint) {
                (Some(file), _) => BackendConfig::replay(file),
                (None, endpoint) => http_backend(
                    endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
                    timeout_secs,
                ),
            },
        };

        MergedConfig {
            backend,
            output: args.output.or(self.output).unwrap_or_default(),
            no_color: args.no_color || self.no_color.unwrap_or(false),
        }
    }
}

fn http_backend(endpoint: &str, timeout_secs: Option<u64>) -> BackendConfig {
    let mut config = ClientConfig::new(endpoint);
    if let Some(secs) = timeout_secs {
        config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    BackendConfig::Http(config)
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub backend: BackendConfig,
    pub output: OutputFormat,
    pub no_color: bool,
}
