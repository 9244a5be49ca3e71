//! Error taxonomy for cRIO webserver operations

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::status::OutcomeKind;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, CrioError>;

/// Why a request failed before any HTTP status was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailure {
    /// Connection refused, unreachable host or DNS failure
    Connect,
    /// The request did not complete within the configured timeout
    Timeout,
    /// The caller cancelled the request
    Cancelled,
    /// The request could not be built or sent
    Request,
    /// The response body could not be read
    Body,
}

impl TransportFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportFailure::Connect => "connect",
            TransportFailure::Timeout => "timeout",
            TransportFailure::Cancelled => "cancelled",
            TransportFailure::Request => "request",
            TransportFailure::Body => "body",
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded detail of a non-success controller response.
///
/// Carries everything needed to log or show the failure to an operator
/// without going back to the raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredError {
    kind: OutcomeKind,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    firmware_code: Option<String>,
}

impl StructuredError {
    pub fn new(
        kind: OutcomeKind,
        status: u16,
        message: impl Into<String>,
        firmware_code: Option<String>,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            firmware_code,
        }
    }

    /// Error for a status whose body is not decoded (404 and unknown codes)
    pub fn generic(kind: OutcomeKind, status: u16) -> Self {
        let message = match kind {
            OutcomeKind::NotFound => format!("HTTP {status}: command path not found on the controller"),
            _ => format!("HTTP {status}: unexpected response from the controller"),
        };
        Self::new(kind, status, message, None)
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Low-level firmware (LabVIEW) error code, when the controller sent one
    pub fn firmware_code(&self) -> Option<&str> {
        self.firmware_code.as_deref()
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.firmware_code {
            write!(f, " (firmware error {code})")?;
        }
        Ok(())
    }
}

/// How a caller should treat a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Controller rejected the request in a documented way
    Operational,
    /// No response was obtained
    Transport,
    /// Client-side setup is wrong
    Configuration,
    /// Controller broke its documented response contract; alert, don't continue
    ContractViolation,
}

/// Errors that can occur while talking to a cRIO controller
#[derive(Debug, Error)]
pub enum CrioError {
    /// No HTTP status was obtained (connect, timeout, cancellation)
    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportFailure,
        message: String,
    },

    /// Status code outside the documented set
    #[error("Unknown status code from controller: {code}")]
    UnknownStatusCode { code: u16 },

    /// 400: the controller rejected the input
    #[error("Bad request: {0}")]
    BadRequest(StructuredError),

    /// 403: the internal web service on the controller is inactive
    #[error("Web service inactive: {0}")]
    ServiceInactive(StructuredError),

    /// 404: the command path does not exist on the controller
    #[error("Not found: {0}")]
    NotFound(StructuredError),

    /// A known status arrived but the body did not have the documented shape
    #[error("Malformed controller payload: {context}")]
    MalformedPayload { context: String },

    /// Endpoint string is not a usable base URL
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Backend configuration could not be loaded or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replay snapshot could not be read
    #[error("Replay source '{path}': {reason}")]
    Replay { path: String, reason: String },
}

impl CrioError {
    pub fn transport(kind: TransportFailure, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedPayload {
            context: context.into(),
        }
    }

    /// Map a decoded failure onto its typed variant
    pub fn from_structured(error: StructuredError) -> Self {
        match error.kind() {
            OutcomeKind::BadRequest => Self::BadRequest(error),
            OutcomeKind::ServiceInactive => Self::ServiceInactive(error),
            OutcomeKind::NotFound => Self::NotFound(error),
            OutcomeKind::UnknownStatus => Self::UnknownStatusCode {
                code: error.status(),
            },
            OutcomeKind::Success => Self::malformed(format!(
                "success status {} reported as a failure",
                error.status()
            )),
        }
    }

    /// The outcome kind for status-derived errors; `None` when no status applies
    pub fn outcome(&self) -> Option<OutcomeKind> {
        match self {
            CrioError::BadRequest(_) => Some(OutcomeKind::BadRequest),
            CrioError::ServiceInactive(_) => Some(OutcomeKind::ServiceInactive),
            CrioError::NotFound(_) => Some(OutcomeKind::NotFound),
            CrioError::UnknownStatusCode { .. } => Some(OutcomeKind::UnknownStatus),
            _ => None,
        }
    }

    pub fn structured(&self) -> Option<&StructuredError> {
        match self {
            CrioError::BadRequest(e) | CrioError::ServiceInactive(e) | CrioError::NotFound(e) => {
                Some(e)
            }
            _ => None,
        }
    }

    /// HTTP status the controller answered with, if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CrioError::UnknownStatusCode { code } => Some(*code),
            other => other.structured().map(StructuredError::status),
        }
    }

    pub fn firmware_code(&self) -> Option<&str> {
        self.structured().and_then(StructuredError::firmware_code)
    }

    /// True when the controller violated its documented response shape
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, CrioError::MalformedPayload { .. })
    }

    /// True for failures that may clear up on their own (connect, timeout).
    ///
    /// Only meaningful for idempotent commands; writes must not be replayed blindly.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CrioError::Transport {
                kind: TransportFailure::Connect | TransportFailure::Timeout,
                ..
            }
        )
    }

    pub fn severity(&self) -> Severity {
        match self {
            CrioError::MalformedPayload { .. } => Severity::ContractViolation,
            CrioError::Transport { .. } => Severity::Transport,
            CrioError::InvalidEndpoint { .. } | CrioError::Config(_) | CrioError::Replay { .. } => {
                Severity::Configuration
            }
            CrioError::UnknownStatusCode { .. }
            | CrioError::BadRequest(_)
            | CrioError::ServiceInactive(_)
            | CrioError::NotFound(_) => Severity::Operational,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_structured_maps_each_failure_kind() {
        let bad = StructuredError::new(OutcomeKind::BadRequest, 400, "bad tag", Some("E12".into()));
        assert!(matches!(CrioError::from_structured(bad), CrioError::BadRequest(_)));

        let inactive = StructuredError::new(OutcomeKind::ServiceInactive, 403, "off", None);
        assert!(matches!(
            CrioError::from_structured(inactive),
            CrioError::ServiceInactive(_)
        ));

        let missing = StructuredError::generic(OutcomeKind::NotFound, 404);
        assert!(matches!(CrioError::from_structured(missing), CrioError::NotFound(_)));

        let unknown = StructuredError::generic(OutcomeKind::UnknownStatus, 502);
        assert!(matches!(
            CrioError::from_structured(unknown),
            CrioError::UnknownStatusCode { code: 502 }
        ));
    }

    #[test]
    fn test_status_and_firmware_code_accessors() {
        let err = CrioError::BadRequest(StructuredError::new(
            OutcomeKind::BadRequest,
            400,
            "bad tag",
            Some("E12".into()),
        ));
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.firmware_code(), Some("E12"));
        assert_eq!(err.outcome(), Some(OutcomeKind::BadRequest));
        assert_eq!(err.to_string(), "Bad request: bad tag (firmware error E12)");

        let transport = CrioError::transport(TransportFailure::Timeout, "timed out");
        assert_eq!(transport.status_code(), None);
        assert_eq!(transport.outcome(), None);
    }

    #[test]
    fn test_generic_not_found_message_carries_status() {
        let err = StructuredError::generic(OutcomeKind::NotFound, 404);
        assert!(err.message().contains("404"));
        assert_eq!(err.firmware_code(), None);
    }

    #[test]
    fn test_malformed_payload_is_distinguishable() {
        let err = CrioError::malformed("missing 'CurrentData'");
        assert!(err.is_contract_violation());
        assert_eq!(err.severity(), Severity::ContractViolation);
        assert!(!err.is_transient());

        let bad = CrioError::from_structured(StructuredError::new(
            OutcomeKind::BadRequest,
            400,
            "x",
            None,
        ));
        assert!(!bad.is_contract_violation());
        assert_eq!(bad.severity(), Severity::Operational);
    }

    #[test]
    fn test_transient_only_for_connect_and_timeout() {
        assert!(CrioError::transport(TransportFailure::Connect, "refused").is_transient());
        assert!(CrioError::transport(TransportFailure::Timeout, "slow").is_transient());
        assert!(!CrioError::transport(TransportFailure::Cancelled, "stop").is_transient());
        assert!(!CrioError::UnknownStatusCode { code: 500 }.is_transient());
    }
}
