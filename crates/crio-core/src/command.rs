//! Commands understood by the cRIO webserver

use std::fmt;

/// HTTP method used for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }

    /// Safe to repeat without changing controller state
    pub fn is_idempotent(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A controller command, bound to a fixed path suffix and method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetCurrentData,
    GetSystemInformation,
    GetAlarmInformation,
    SetSetpoint,
    SetMultipleSetpoints,
    SwitchDataLogging,
    ConfigurePIDController,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::GetCurrentData,
        Command::GetSystemInformation,
        Command::GetAlarmInformation,
        Command::SetSetpoint,
        Command::SetMultipleSetpoints,
        Command::SwitchDataLogging,
        Command::ConfigurePIDController,
    ];

    /// Path suffix relative to the endpoint, without a leading slash
    pub fn path(&self) -> &'static str {
        match self {
            Command::GetCurrentData => "CurrentData",
            Command::GetSystemInformation => "SystemInformation",
            Command::GetAlarmInformation => "AlarmInformation",
            Command::SetSetpoint => "SetSetpoint",
            Command::SetMultipleSetpoints => "SetMultipleSetpoints",
            Command::SwitchDataLogging => "SwitchDataLogging",
            Command::ConfigurePIDController => "ConfigurePIDController",
        }
    }

    pub fn method(&self) -> HttpMethod {
        if self.is_read() {
            HttpMethod::Get
        } else {
            HttpMethod::Put
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Command::GetCurrentData | Command::GetSystemInformation | Command::GetAlarmInformation
        )
    }

    /// Look up a command by its path suffix (leading slash tolerated)
    pub fn from_path(path: &str) -> Option<Command> {
        let path = path.trim_start_matches('/');
        Self::ALL.into_iter().find(|c| c.path() == path)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
