//! Classification of controller HTTP status codes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single controller response. Exactly one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// 200
    Success,
    /// 400 - input rejected, body carries an error envelope
    BadRequest,
    /// 403 - internal web service inactive, body carries an error envelope
    ServiceInactive,
    /// 404
    NotFound,
    /// Anything else
    UnknownStatus,
}

impl OutcomeKind {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Success)
    }

    /// Whether the firmware documents a structured body for this outcome
    pub fn has_error_envelope(&self) -> bool {
        matches!(self, OutcomeKind::BadRequest | OutcomeKind::ServiceInactive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::BadRequest => "bad_request",
            OutcomeKind::ServiceInactive => "service_inactive",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::UnknownStatus => "unknown_status",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a status code to its outcome. Independent of the command issued.
pub fn classify(status: u16) -> OutcomeKind {
    match status {
        200 => OutcomeKind::Success,
        400 => OutcomeKind::BadRequest,
        403 => OutcomeKind::ServiceInactive,
        404 => OutcomeKind::NotFound,
        _ => OutcomeKind::UnknownStatus,
    }
}
