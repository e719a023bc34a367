use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Health flag for a server.
///
/// The two canonical spellings `"OK"` and `"ERROR"` are a contract with any
/// external persistence that stores status as text; they round-trip through
/// [`ServerStatus::as_str`] and [`FromStr`] exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    /// Server is currently considered usable.
    #[default]
    Ok,
    /// Caller has marked the server unusable (connection failures etc.).
    Error,
}

impl ServerStatus {
    /// Canonical string form.
    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Ok => "OK",
            ServerStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is neither `"OK"` nor `"ERROR"`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized server status: {0:?}")]
pub struct ParseStatusError(String);

impl FromStr for ServerStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(ServerStatus::Ok),
            "ERROR" => Ok(ServerStatus::Error),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
