//! Decoding of controller error envelopes

use serde_json::Value;

use crate::error::{CrioError, Result, StructuredError};
use crate::status::OutcomeKind;

/// Envelope key of a 400 response body
pub const BAD_REQUEST_ENVELOPE: &str = "400 (Bad Request) response";
/// Envelope key of a 403 response body
pub const SERVICE_INACTIVE_ENVELOPE: &str = "403 (Forbidden) response";
/// Firmware diagnostic field inside the 400 envelope
pub const FIRMWARE_ERROR_FIELD: &str = "LabVIEW error";
/// Human message field inside both envelopes
pub const MESSAGE_FIELD: &str = "message";

/// Build the structured error for a failed response.
///
/// 400 and 403 bodies must carry their envelope; a missing envelope or
/// message is a contract violation. 404 and unknown statuses are not
/// guaranteed a body and are described generically.
pub fn decode_error(kind: OutcomeKind, status: u16, body: &Value) -> Result<StructuredError> {
    match kind {
        OutcomeKind::BadRequest => {
            let envelope = envelope(body, BAD_REQUEST_ENVELOPE)?;
            let message = message(envelope, BAD_REQUEST_ENVELOPE)?;
            let firmware_code = envelope.get(FIRMWARE_ERROR_FIELD).map(render_code);
            Ok(StructuredError::new(kind, status, message, firmware_code))
        }
        OutcomeKind::ServiceInactive => {
            let envelope = envelope(body, SERVICE_INACTIVE_ENVELOPE)?;
            let message = message(envelope, SERVICE_INACTIVE_ENVELOPE)?;
            Ok(StructuredError::new(kind, status, message, None))
        }
        OutcomeKind::NotFound | OutcomeKind::UnknownStatus => {
            Ok(StructuredError::generic(kind, status))
        }
        OutcomeKind::Success => Err(CrioError::malformed(format!(
            "status {status} is not a failure"
        ))),
    }
}

fn envelope<'a>(body: &'a Value, key: &str) -> Result<&'a Value> {
    body.get(key)
        .ok_or_else(|| CrioError::malformed(format!("error response has no '{key}' envelope")))
}

fn message(envelope: &Value, key: &str) -> Result<String> {
    match envelope.get(MESSAGE_FIELD) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(CrioError::malformed(format!(
            "'{key}' envelope has no '{MESSAGE_FIELD}'"
        ))),
    }
}

/// Strings are kept verbatim; numbers and clusters use their JSON text
fn render_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
