//! Severity levels and the process-wide threshold
//!
//! Severities are ordered masks: a more verbose level compares greater
//! than every more severe level, so `threshold >= level` is the whole
//! gating rule.

use crate::error::{LogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity, ordered from silent to most verbose
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    #[default]
    None = 0x00,
    Error = 0x07,
    Warn = 0x0F,
    Info = 0x1F,
    Debug = 0x2F,
    Trace = 0xFF,
}

impl Severity {
    /// Every emitting severity, most severe first
    pub const ALL: [Severity; 5] = [
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ];

    /// Raw mask value
    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Map a raw mask back to a severity (unknown values collapse to `None`)
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0x07 => Self::Error,
            0x0F => Self::Warn,
            0x1F => Self::Info,
            0x2F => Self::Debug,
            0xFF => Self::Trace,
            _ => Self::None,
        }
    }

    /// Parse a case-insensitive level name (unknown names collapse to `None`)
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::None,
        }
    }

    /// Parse a hex mask such as `0x1F`
    ///
    /// A malformed string is an error; a well-formed but unknown mask is `None`.
    pub fn from_hex(value: &str) -> Result<Self> {
        let invalid = || LogError::InvalidLevel {
            value: value.to_string(),
        };

        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .filter(|d| !d.is_empty())
            .ok_or_else(invalid)?;
        let parsed = i64::from_str_radix(digits, 16).map_err(|_| invalid())?;

        Ok(u8::try_from(parsed)
            .map(Self::from_bits)
            .unwrap_or(Self::None))
    }

    /// Hex mask as written in configuration files
    pub fn to_hex(self) -> &'static str {
        match self {
            Self::None => "0x0",
            Self::Error => "0x7",
            Self::Warn => "0xF",
            Self::Info => "0x1F",
            Self::Debug => "0x2F",
            Self::Trace => "0xFF",
        }
    }

    /// Label padded to the 5-column severity field of a log line
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "NONE ",
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        };
        f.write_str(name)
    }
}

/// Effective threshold shared by every emission call (lock-free)
#[derive(Debug, Default)]
pub struct LevelRegistry {
    bits: AtomicU8,
}

impl LevelRegistry {
    pub fn new(level: Severity) -> Self {
        Self {
            bits: AtomicU8::new(level.bits()),
        }
    }

    #[inline]
    pub fn set(&self, level: Severity) {
        self.bits.store(level.bits(), Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> Severity {
        Severity::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// `true` when an event of `level` passes the threshold
    #[inline]
    pub fn is_enabled(&self, level: Severity) -> bool {
        level != Severity::None && self.bits.load(Ordering::Acquire) >= level.bits()
    }
}
