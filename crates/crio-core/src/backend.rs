//! ControllerBackend trait - the capability interface shared by live and replay backends

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::{CurrentData, PidConfiguration, Setpoint};

/// Operations a cRIO controller (or a stand-in for one) exposes.
///
/// The live HTTP client and the replay backend both implement this; which
/// one a caller gets is decided by configuration. Every call is a single,
/// independent request: implementations keep no session state and never
/// retry.
#[async_trait]
pub trait ControllerBackend: Send + Sync {
    /// Short description of where this backend talks to (for logs)
    fn describe(&self) -> String;

    // =========================================================================
    // Reads
    // =========================================================================

    /// Latest values and units of all tags
    async fn get_current_data(&self) -> Result<CurrentData>;

    /// Controller system information, as sent by the firmware
    async fn get_system_information(&self) -> Result<Map<String, Value>>;

    /// Active alarm information, as sent by the firmware
    async fn get_alarm_information(&self) -> Result<Map<String, Value>>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write one setpoint
    async fn set_setpoint(&self, setpoint: &Setpoint) -> Result<()>;

    /// Write several setpoints in one request.
    ///
    /// No atomicity is implied: a rejection reports whatever single error
    /// the controller returned, and earlier tags may already have been applied.
    async fn set_multiple_setpoints(&self, setpoints: &[Setpoint]) -> Result<()>;

    /// Turn the controller's internal data logging on or off
    async fn switch_data_logging(&self, on: bool) -> Result<()>;

    /// Assign process and control variables to a PID controller
    async fn configure_pid_controller(&self, configuration: &PidConfiguration) -> Result<()>;
}
