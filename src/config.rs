//! Logging preference
//!
//! A `Preference` is the snapshot handed to `Logger::new`. It can be built
//! in code or loaded from a TOML document; missing keys take defaults.

use crate::constants::{
    DEFAULT_KEEPING_FILE_DAYS, DEFAULT_MAX_TRACE_DEPTH, DEFAULT_SOURCE_PRINT_WIDTH,
    LOG_FILE_EXTENSION, MIN_MAX_TRACE_DEPTH,
};
use crate::error::{LogError, Result};
use crate::event::RenderOptions;
use crate::level::Severity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

// =============================================================================
// Modes
// =============================================================================

/// Where rendered lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    #[default]
    Stdout,
    /// Daily rotated file under `log_dir`
    File,
}

/// How events travel from the caller to the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Render and write on the calling thread
    #[default]
    Sync,
    /// Push onto a bounded queue drained by one writer thread
    Async,
}

// =============================================================================
// Preference
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preference {
    /// Directory holding the active file and its backups (empty = stdout)
    pub log_dir: PathBuf,
    pub stream: StreamMode,
    /// Base name of `<name>.log` and `<name>.<date>.log`
    pub process_name: String,
    pub default_level: Severity,
    pub delivery: DeliveryMode,
    pub keeping_file_days: u16,
    pub source_print_width: usize,
    pub max_trace_depth: usize,
    pub show_method: bool,
    /// Accepted, not enforced
    pub file_size_limit_mb: Option<u16>,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::new(),
            stream: StreamMode::Stdout,
            process_name: program_name(),
            default_level: Severity::Trace,
            delivery: DeliveryMode::Sync,
            keeping_file_days: DEFAULT_KEEPING_FILE_DAYS,
            source_print_width: DEFAULT_SOURCE_PRINT_WIDTH,
            max_trace_depth: DEFAULT_MAX_TRACE_DEPTH,
            show_method: true,
            file_size_limit_mb: None,
        }
    }
}

impl Preference {
    /// Preference writing into `log_dir`, or stdout when it is empty
    ///
    /// The directory is created if missing. When that fails the preference
    /// falls back to stdout instead of returning an error.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        let stream = resolve_stream(&log_dir);
        Self {
            log_dir,
            stream,
            ..Self::default()
        }
    }

    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_level(mut self, level: Severity) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    /// Parse a TOML document
    ///
    /// A `file` stream still goes through directory preparation, so a
    /// directory that cannot be created degrades to stdout.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut pref: Preference = toml::from_str(content).map_err(|e| LogError::ConfigParse {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        if pref.stream == StreamMode::File {
            pref.stream = resolve_stream(&pref.log_dir);
        }
        Ok(pref)
    }

    /// Load a preference file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LogError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            LogError::ConfigParse { reason, .. } => LogError::ConfigParse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Replace out-of-range values with defaults
    pub fn normalize(&mut self) {
        if self.keeping_file_days < 1 {
            self.keeping_file_days = DEFAULT_KEEPING_FILE_DAYS;
        }
        if self.source_print_width < 1 {
            self.source_print_width = DEFAULT_SOURCE_PRINT_WIDTH;
        }
        if self.max_trace_depth < MIN_MAX_TRACE_DEPTH {
            self.max_trace_depth = DEFAULT_MAX_TRACE_DEPTH;
        }
        if self.process_name.trim().is_empty() {
            self.process_name = program_name();
        }
    }

    /// Path of the active log file
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir
            .join(format!("{}.{}", self.process_name, LOG_FILE_EXTENSION))
    }
}

// =============================================================================
// Runtime settings
// =============================================================================

/// The part of a preference that stays mutable after initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub source_print_width: usize,
    pub show_method: bool,
    pub max_trace_depth: usize,
    pub keeping_file_days: u16,
    pub file_size_limit_mb: Option<u16>,
}

impl RuntimeSettings {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            print_width: self.source_print_width,
            show_method: self.show_method,
        }
    }
}

impl From<&Preference> for RuntimeSettings {
    fn from(pref: &Preference) -> Self {
        Self {
            source_print_width: pref.source_print_width,
            show_method: pref.show_method,
            max_trace_depth: pref.max_trace_depth,
            keeping_file_days: pref.keeping_file_days,
            file_size_limit_mb: pref.file_size_limit_mb,
        }
    }
}

fn resolve_stream(log_dir: &Path) -> StreamMode {
    if log_dir.as_os_str().is_empty() {
        return StreamMode::Stdout;
    }
    match ensure_directory(log_dir) {
        Ok(()) => StreamMode::File,
        Err(e) => {
            warn!("Failed to prepare log folder: {}, using stdout", e);
            StreamMode::Stdout
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| LogError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Executable name without directories or trailing arguments
pub fn program_name() -> String {
    let arg0 = std::env::args().next().unwrap_or_default();
    basename_of(&arg0)
}

fn basename_of(arg0: &str) -> String {
    let name = arg0.rsplit(['/', '\\']).next().unwrap_or(arg0);
    let name = match name.find(' ') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    if name.is_empty() {
        "daylog".to_string()
    } else {
        name.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
