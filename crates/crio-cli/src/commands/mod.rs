//! Command implementations for the crio CLI

pub mod read;
pub mod write;

pub use read::{alarms, current, system};
pub use write::{logging, pid, set, set_many};
