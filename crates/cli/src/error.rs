//! CLI errors and their exit codes.
//!
//! - 0:  success
//! - 2:  argument parse error (clap)
//! - 10: scene error (bad dimensions, invalid field or gradient)
//! - 11: I/O error (config read, PNG write)
//! - 12: input error (bad JSON params, bad color)
//! - 13: serialization error

use std::fmt;
use windtrail_core::WindError;

#[derive(Debug)]
pub enum CliError {
    Scene(WindError),
    Io(String),
    Input(String),
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Scene(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Scene(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                f.write_str(msg)
            }
        }
    }
}

impl From<WindError> for CliError {
    fn from(e: WindError) -> Self {
        match e {
            WindError::Io(msg) => CliError::Io(msg),
            WindError::InvalidColor(msg) => CliError::Input(msg),
            other => CliError::Scene(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
