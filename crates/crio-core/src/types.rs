//! Request payloads and normalized results exchanged with the controller

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel entry in the current-data payload holding the controller clock
pub const TIMESTAMP_TAG: &str = "cRIO Timestamp";

/// Class suffix the firmware expects on PID controller names
pub const CONTROLLER_CLASS_SUFFIX: &str = " Controller.lvclass";

// =============================================================================
// Write payloads
// =============================================================================

/// Numeric setpoint value. Integers stay integers on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetpointValue {
    Integer(i64),
    Float(f64),
}

impl SetpointValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            SetpointValue::Integer(v) => v as f64,
            SetpointValue::Float(v) => v,
        }
    }
}

impl From<i32> for SetpointValue {
    fn from(v: i32) -> Self {
        SetpointValue::Integer(v.into())
    }
}

impl From<i64> for SetpointValue {
    fn from(v: i64) -> Self {
        SetpointValue::Integer(v)
    }
}

impl From<f32> for SetpointValue {
    fn from(v: f32) -> Self {
        SetpointValue::Float(v.into())
    }
}

impl From<f64> for SetpointValue {
    fn from(v: f64) -> Self {
        SetpointValue::Float(v)
    }
}

impl std::fmt::Display for SetpointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetpointValue::Integer(v) => write!(f, "{v}"),
            SetpointValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A target value for a single tag
///
/// Serializes to `{"Tag": ..., "Value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Value")]
    value: SetpointValue,
}

impl Setpoint {
    pub fn new(tag: impl Into<String>, value: impl Into<SetpointValue>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> SetpointValue {
        self.value
    }
}

/// Process/control variable pairing for a PID loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidLoop {
    #[serde(rename = "PV Tag")]
    pv_tag: String,
    #[serde(rename = "CV Tag")]
    cv_tag: String,
}

impl PidLoop {
    pub fn pv_tag(&self) -> &str {
        &self.pv_tag
    }

    pub fn cv_tag(&self) -> &str {
        &self.cv_tag
    }
}

/// Configuration of one PID controller running on the cRIO
///
/// The controller tag (`C-xxx`) is stored with the firmware class suffix,
/// e.g. `"C-001 Controller.lvclass"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidConfiguration {
    #[serde(rename = "Controller")]
    controller: String,
    #[serde(rename = "Configuration")]
    configuration: PidLoop,
}

impl PidConfiguration {
    /// Create a configuration
    ///
    /// # Arguments
    /// * `controller` - Controller tag, e.g. `"C-001"`
    /// * `pv` - Tag held at the controller setpoint
    /// * `cv` - Tag receiving the control action
    pub fn new(controller: &str, pv: impl Into<String>, cv: impl Into<String>) -> Self {
        Self {
            controller: format!("{controller}{CONTROLLER_CLASS_SUFFIX}"),
            configuration: PidLoop {
                pv_tag: pv.into(),
                cv_tag: cv.into(),
            },
        }
    }

    /// Controller name including the class suffix
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn configuration(&self) -> &PidLoop {
        &self.configuration
    }
}

/// Body of the data logging toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLogging {
    #[serde(rename = "On?")]
    pub on: bool,
}

// =============================================================================
// Read results
// =============================================================================

/// Latest process values held by the controller
///
/// `values` and `units` are keyed by the same tags. `units` additionally
/// holds [`TIMESTAMP_TAG`] mapped to the raw controller timestamp, which is
/// how the firmware reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentData {
    pub values: BTreeMap<String, Value>,
    pub units: BTreeMap<String, Value>,
}

impl CurrentData {
    pub fn value(&self, tag: &str) -> Option<&Value> {
        self.values.get(tag)
    }

    /// Unit of a tag, if it is a string
    pub fn unit(&self, tag: &str) -> Option<&str> {
        self.units.get(tag).and_then(Value::as_str)
    }

    /// Raw controller timestamp
    pub fn timestamp(&self) -> Option<&Value> {
        self.units.get(TIMESTAMP_TAG)
    }

    /// Process tags, without the timestamp sentinel
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
