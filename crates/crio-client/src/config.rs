//! Backend configuration with TOML/JSON support
//!
//! Selects between the live webserver client and the replay backend.
//!
//! ```toml
//! backend = "http"
//! endpoint = "http://192.168.1.10:8001"
//! timeout_ms = 5000
//! ```
//!
//! ```toml
//! backend = "replay"
//! file = "snapshots/current.csv"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crio_core::{ControllerBackend, CrioError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{CrioClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::replay::ReplayBackend;

/// Settings for the live webserver client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the controller webserver
    pub endpoint: String,

    /// Request timeout in milliseconds; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection timeout in milliseconds; 0 disables it
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Set the request timeout; `None` disables it
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_ms = timeout.map_or(0, |t| t.as_millis() as u64);
        self
    }

    /// Set the connection timeout; `None` disables it
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout_ms = timeout.map_or(0, |t| t.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

/// Settings for the replay backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// CSV snapshot with `TAG,VALUE,UNITS` columns
    pub file: PathBuf,
}

/// Which backend to talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Live controller webserver
    Http(ClientConfig),
    /// Canned values from a snapshot file
    Replay(ReplayConfig),
}

impl BackendConfig {
    pub fn http(endpoint: impl Into<String>) -> Self {
        Self::Http(ClientConfig::new(endpoint))
    }

    pub fn replay(file: impl Into<PathBuf>) -> Self {
        Self::Replay(ReplayConfig { file: file.into() })
    }

    /// Load from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CrioError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| CrioError::Config(e.to_string()))
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CrioError::Config(e.to_string()))
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CrioError::Config(e.to_string()))
    }

    /// Build the selected backend
    pub fn connect(&self) -> Result<Arc<dyn ControllerBackend>> {
        let backend: Arc<dyn ControllerBackend> = match self {
            BackendConfig::Http(config) => Arc::new(CrioClient::from_config(config)?),
            BackendConfig::Replay(config) => Arc::new(ReplayBackend::new(&config.file)),
        };
        info!(backend = %backend.describe(), "Backend selected");
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_http_toml_parsing() {
        let toml = r#"
backend = "http"
endpoint = "http://192.168.1.10:8001"
timeout_ms = 5000
"#;

        let config = BackendConfig::from_toml(toml).unwrap();
        let BackendConfig::Http(client) = config else {
            panic!("expected http backend");
        };
        assert_eq!(client.endpoint, "http://192.168.1.10:8001");
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(client.connect_timeout(), Some(DEFAULT_CONNECT_TIMEOUT));
    }

    #[test]
    fn test_replay_toml_parsing() {
        let config = BackendConfig::from_toml("backend = \"replay\"\nfile = \"snap.csv\"\n").unwrap();
        assert_eq!(config, BackendConfig::replay("snap.csv"));
    }

    #[test]
    fn test_json_parsing() {
        let config =
            BackendConfig::from_json(r#"{"backend": "http", "endpoint": "http://crio:8001"}"#)
                .unwrap();
        assert_eq!(config, BackendConfig::http("http://crio:8001"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = BackendConfig::from_toml("backend = \"serial\"\n").unwrap_err();
        assert!(matches!(err, CrioError::Config(_)));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = ClientConfig::new("http://crio").with_timeout(None);
        assert_eq!(config.timeout_ms, 0);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_zero_connect_timeout_disables() {
        let config = BackendConfig::from_toml(
            "backend = \"http\"\nendpoint = \"http://crio\"\nconnect_timeout_ms = 0\n",
        )
        .unwrap();
        let BackendConfig::Http(client) = config else {
            panic!("expected http backend");
        };
        assert_eq!(client.connect_timeout(), None);
        assert_eq!(
            ClientConfig::new("http://crio").with_connect_timeout(None),
            client
        );
    }

    #[test]
    fn test_toml_roundtrip_keeps_selection() {
        let config = BackendConfig::Http(
            ClientConfig::new("http://crio:8001").with_timeout(Some(Duration::from_millis(750))),
        );
        let parsed = BackendConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_connect_selects_backend() {
        let http = BackendConfig::http("http://localhost:8001").connect().unwrap();
        assert!(http.describe().contains("http://localhost:8001"));

        let replay = BackendConfig::replay("snap.csv").connect().unwrap();
        assert!(replay.describe().contains("snap.csv"));
    }

    #[test]
    fn test_connect_rejects_bad_endpoint() {
        let err = BackendConfig::http("crio.local").connect().err().unwrap();
        assert!(matches!(err, CrioError::InvalidEndpoint { .. }));
    }
}
