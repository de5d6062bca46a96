//! Centralized error types for the logging facility
//!
//! Only configuration loading and setup helpers return `LogError`.
//! The emission path never propagates an error to the caller.

use std::fmt;
use std::path::PathBuf;

/// All logging facility errors
#[derive(Debug)]
pub enum LogError {
    // === IO ===
    /// File system operation on a log file or directory failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Config ===
    /// Failed to read a preference file
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Preference file is not valid TOML or has bad values
    ConfigParse { path: PathBuf, reason: String },
    /// Severity string could not be parsed
    InvalidLevel { value: String },

    // === Runtime ===
    /// Failed to spawn the writer thread
    Spawn { source: std::io::Error },
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::ConfigRead { source, .. } | Self::Spawn { source } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::ConfigRead { path, .. } => {
                write!(f, "Cannot read preference file: {}", path.display())
            }
            Self::ConfigParse { path, reason } => {
                write!(f, "Invalid preference file {}: {}", path.display(), reason)
            }
            Self::InvalidLevel { value } => write!(f, "Invalid log level: {}", value),
            Self::Spawn { .. } => write!(f, "Failed to spawn log writer thread"),
        }
    }
}

/// Alias for Result with LogError
pub type Result<T> = std::result::Result<T, LogError>;
