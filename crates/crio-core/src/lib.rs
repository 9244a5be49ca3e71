//! crio-core - Core types and response handling for cRIO webserver clients
//!
//! This crate holds everything that does not depend on a transport: the
//! command table, request payloads, the status classifier, the payload
//! normalizer, the error-envelope decoder and the error taxonomy. Backends
//! (the HTTP client, the replay source) implement [`ControllerBackend`].

pub mod backend;
pub mod command;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod normalize;
pub mod status;
pub mod types;

pub use backend::ControllerBackend;
pub use command::{Command, HttpMethod};
pub use decode::decode_error;
pub use endpoint::Endpoint;
pub use error::{CrioError, Result, Severity, StructuredError, TransportFailure};
pub use normalize::{normalize_current_data, normalize_object};
pub use status::{classify, OutcomeKind};
pub use types::*;
