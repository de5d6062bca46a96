//! External error reporting bridge
//!
//! The pipeline hands `(severity, error)` pairs for error-trace events to a
//! `Reporter`. The client behind it (connectivity, batching, credentials)
//! belongs to the host application; the default reporter does nothing.

use crate::constants::MIN_REPORTING_ENDPOINT_LEN;
use crate::level::Severity;
use std::collections::HashMap;
use std::error::Error;

/// Receives errors attached to warn/error events
pub trait Reporter: Send + Sync {
    fn report(&self, severity: Severity, error: &(dyn Error + Send + Sync + 'static));

    /// Called with the current settings once an endpoint is configured
    fn configure(&self, _config: &ReportingConfig) {}
}

/// Reporter used until one is installed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _severity: Severity, _error: &(dyn Error + Send + Sync + 'static)) {}
}

/// Endpoint and tags handed to the reporting client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingConfig {
    pub endpoint: String,
    /// e.g. `environment`, `serverName`, `process`
    pub tags: HashMap<String, String>,
    /// Most verbose severity that is still reported
    pub level: Severity,
    pub flush_secs: u8,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            tags: HashMap::new(),
            level: Severity::Warn,
            flush_secs: 2,
        }
    }
}

impl ReportingConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.len() >= MIN_REPORTING_ENDPOINT_LEN
    }

    /// Whether an event of `severity` goes to the reporter
    ///
    /// Only ERROR and WARN are ever reported, further narrowed by `level`.
    pub fn accepts(&self, severity: Severity) -> bool {
        matches!(severity, Severity::Error | Severity::Warn) && severity <= self.level
    }
}
