//! Replay backend serving canned values from a snapshot file
//!
//! The snapshot is a CSV export of the lab spreadsheet: the first column is
//! the tag, followed by `VALUE` and `UNITS` columns (header names are
//! matched case-insensitively; `UNIT` is accepted as well).
//!
//! ```text
//! TAG,VALUE,UNITS
//! TI-101,21.5,degC
//! FIC-102,12,kg/h
//! cRIO Timestamp,2024-01-01T00:00:00,
//! ```
//!
//! The file is re-read on every call so it can be edited while a session is
//! running. Writes are logged and otherwise ignored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crio_core::{
    ControllerBackend, CrioError, CurrentData, PidConfiguration, Result, Setpoint, TIMESTAMP_TAG,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Timestamp format used when the snapshot carries none
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Why a snapshot could not be parsed
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing {0} column")]
    MissingColumn(&'static str),

    /// Line numbers are 1-based and count the header
    #[error("duplicate tag '{tag}' on line {line}")]
    DuplicateTag { tag: String, line: usize },
}

/// Backend that answers reads from a CSV snapshot
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    path: PathBuf,
}

impl ReplayBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot
    pub async fn load(&self) -> Result<CurrentData> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.error(e.to_string()))?;
        let data = parse_snapshot(&raw).map_err(|e| self.error(e.to_string()))?;
        debug!(path = %self.path.display(), tags = data.len(), "Loaded replay snapshot");
        Ok(data)
    }

    fn error(&self, reason: String) -> CrioError {
        CrioError::Replay {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

/// Parse a snapshot into the same shape the live normalizer produces
pub fn parse_snapshot(raw: &[u8]) -> std::result::Result<CurrentData, SnapshotError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw);

    let headers = reader.headers()?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let value_col = column(&["VALUE"]).ok_or(SnapshotError::MissingColumn("VALUE"))?;
    let unit_col = column(&["UNITS", "UNIT"]).ok_or(SnapshotError::MissingColumn("UNITS"))?;

    let mut data = CurrentData::default();
    let mut timestamp = None;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let tag = record.get(0).unwrap_or_default();
        if tag.is_empty() {
            continue;
        }
        // +2: header line and 1-based numbering
        let duplicate = || SnapshotError::DuplicateTag {
            tag: tag.to_string(),
            line: index + 2,
        };
        let value = parse_cell(record.get(value_col).unwrap_or_default());

        if tag == TIMESTAMP_TAG {
            if timestamp.replace(value).is_some() {
                return Err(duplicate());
            }
            continue;
        }
        if data.values.contains_key(tag) {
            return Err(duplicate());
        }

        let unit = record.get(unit_col).unwrap_or_default();
        data.values.insert(tag.to_string(), value);
        data.units.insert(tag.to_string(), Value::String(unit.to_string()));
    }

    let timestamp = timestamp.unwrap_or_else(|| {
        Value::String(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string())
    });
    data.units.insert(TIMESTAMP_TAG.to_string(), timestamp);

    Ok(data)
}

/// Integers and floats become JSON numbers, empty cells null, the rest strings
fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = cell.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}

#[async_trait]
impl ControllerBackend for ReplayBackend {
    fn describe(&self) -> String {
        format!("replay snapshot {}", self.path.display())
    }

    async fn get_current_data(&self) -> Result<CurrentData> {
        self.load().await
    }

    async fn get_system_information(&self) -> Result<Map<String, Value>> {
        let mut info = Map::new();
        info.insert("Mode".to_string(), Value::from("Replay"));
        info.insert(
            "Source".to_string(),
            Value::from(self.path.display().to_string()),
        );
        Ok(info)
    }

    async fn get_alarm_information(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    async fn set_setpoint(&self, setpoint: &Setpoint) -> Result<()> {
        info!(
            "Replay: changed setpoint of {} to {} (not applied)",
            setpoint.tag(),
            setpoint.value()
        );
        Ok(())
    }

    async fn set_multiple_setpoints(&self, setpoints: &[Setpoint]) -> Result<()> {
        for setpoint in setpoints {
            self.set_setpoint(setpoint).await?;
        }
        Ok(())
    }

    async fn switch_data_logging(&self, on: bool) -> Result<()> {
        info!("Replay: data logging switched to {} (not applied)", on);
        Ok(())
    }

    async fn configure_pid_controller(&self, configuration: &PidConfiguration) -> Result<()> {
        info!(
            "Replay: {} configured with PV {} and CV {} (not applied)",
            configuration.controller(),
            configuration.configuration().pv_tag(),
            configuration.configuration().cv_tag()
        );
        Ok(())
    }
}
