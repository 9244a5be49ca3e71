//! cRIO Client Library
//!
//! Provides a typed HTTP client for the webserver running on a cRIO
//! controller, plus a replay backend that serves canned values from a
//! snapshot file.
//!
//! # Example
//!
//! ```rust,no_run
//! use crio_client::{CrioClient, Setpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), crio_client::CrioError> {
//!     let client = CrioClient::new("http://192.168.1.10:8001")?;
//!
//!     // Read the latest process values
//!     let data = client.get_current_data().await?;
//!     println!("TI-101 = {:?} {:?}", data.value("TI-101"), data.unit("TI-101"));
//!
//!     // Write a setpoint
//!     client.set_setpoint(&Setpoint::new("TIC-101", 65.0)).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Choosing a backend
//!
//! [`BackendConfig`] selects the live client or the replay backend and
//! hands back an `Arc<dyn ControllerBackend>`:
//!
//! ```rust,ignore
//! let backend = BackendConfig::from_toml_file("crio.toml")?.connect()?;
//! let alarms = backend.get_alarm_information().await?;
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a scripted mock controller:
//!
//! ```rust,ignore
//! use crio_client::testing::{MockController, MockResponse, TestServer};
//!
//! let mock = MockController::new()
//!     .respond(Command::SetSetpoint, MockResponse::bad_request("bad tag", "E12"));
//! let server = TestServer::mock(&mock).await?;
//! ```

mod client;
pub mod config;
pub mod replay;
pub mod testing;

pub use client::{CrioClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
pub use config::{BackendConfig, ClientConfig, ReplayConfig};
pub use replay::{ReplayBackend, SnapshotError};

// Re-export core types for convenience
pub use crio_core::{
    Command, ControllerBackend, CrioError, CurrentData, OutcomeKind, PidConfiguration, Result,
    Setpoint, SetpointValue, Severity, StructuredError, TransportFailure,
};

// Re-export the cancellation token accepted by `CrioClient::with_cancellation`
pub use tokio_util::sync::CancellationToken;
