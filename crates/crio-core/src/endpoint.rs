//! Base address of a controller webserver

use std::fmt;

use url::Url;

use crate::command::Command;
use crate::error::{CrioError, Result};

/// Validated base URL of one controller, fixed at construction
///
/// The base may carry a path prefix (e.g. `http://10.0.0.2:8001/webservice`);
/// command suffixes are appended below it with exactly one separating slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse an endpoint string. Only `http` and `https` are accepted.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let invalid = |reason: String| CrioError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let base = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
        match base.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme '{other}'"))),
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if base.query().is_some() || base.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".to_string()));
        }

        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        self.base.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    /// Full URL for a command
    pub fn url_for(&self, command: Command) -> Url {
        self.join(command.path())
    }

    /// Append a path below the base, normalising the slash between them
    pub fn join(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        url.set_path(&format!("{prefix}/{suffix}"));
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
