//! Log events
//!
//! An event is built on the caller's thread, fully populated, and then
//! either written inline or handed to the writer thread. Two variants:
//! - `GeneralEvent` - message plus call site
//! - `ErrorTraceEvent` - additionally carries an error and captured frames
//!
//! Rendering happens once; the line is cached on the event.

pub mod general;
pub mod trace;

pub use general::GeneralEvent;
pub use trace::ErrorTraceEvent;

use crate::callsite::{bare_function_name, CallSite};
use crate::constants::{LINE_TIMESTAMP_FORMAT, SOURCE_ROOT_MARKER};
use crate::level::Severity;
use chrono::{DateTime, Local};
use std::error::Error;
use std::fmt::{self, Write as _};

// =============================================================================
// Render options
// =============================================================================

/// Runtime settings read when an event is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub print_width: usize,
    pub show_method: bool,
}

// =============================================================================
// Payload
// =============================================================================

/// What the caller asked to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Format string already applied to its arguments
    Message(String),
    /// A single value rendered with its type
    Value {
        type_name: &'static str,
        repr: String,
    },
}

impl Payload {
    pub fn message(args: fmt::Arguments<'_>) -> Self {
        Self::Message(fmt::format(args))
    }

    pub fn value<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Self::Value {
            type_name: std::any::type_name::<T>(),
            repr: value.to_string(),
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Message(text) => out.push_str(text),
            Self::Value { type_name, repr } => {
                let _ = write!(out, "({}) :: {}", type_name, repr);
            }
        }
    }
}

// =============================================================================
// Error value
// =============================================================================

/// Error attached to an emission, with the name of its concrete type
pub struct ErrorValue {
    type_name: &'static str,
    error: Box<dyn Error + Send + Sync + 'static>,
}

impl ErrorValue {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<E>(),
            error: Box::new(error),
        }
    }

    /// Wrap an already boxed error
    pub fn boxed(error: Box<dyn Error + Send + Sync + 'static>) -> Self {
        Self {
            type_name: "dyn core::error::Error",
            error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) :: {}", self.type_name, self.error)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) :: {}", self.type_name, self.error)
    }
}

// =============================================================================
// Loggable
// =============================================================================

/// Capability shared by both event variants
pub trait Loggable {
    fn timestamp(&self) -> DateTime<Local>;
    fn level(&self) -> Severity;
    /// Full line(s) including the trailing newline; computed once
    fn render(&self, opts: &RenderOptions) -> &str;
}

/// Tagged event, chosen at construction from whether an error is attached
#[derive(Debug)]
pub enum LogEvent {
    General(GeneralEvent),
    ErrorTrace(ErrorTraceEvent),
}

impl LogEvent {
    pub fn error(&self) -> Option<&ErrorValue> {
        match self {
            Self::General(_) => None,
            Self::ErrorTrace(e) => Some(e.origin_error()),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timestamp(self, timestamp: DateTime<Local>) -> Self {
        match self {
            Self::General(mut e) => {
                e.header.timestamp = timestamp;
                Self::General(e)
            }
            Self::ErrorTrace(mut e) => {
                e.header.timestamp = timestamp;
                Self::ErrorTrace(e)
            }
        }
    }
}

impl Loggable for LogEvent {
    fn timestamp(&self) -> DateTime<Local> {
        match self {
            Self::General(e) => e.timestamp(),
            Self::ErrorTrace(e) => e.timestamp(),
        }
    }

    fn level(&self) -> Severity {
        match self {
            Self::General(e) => e.level(),
            Self::ErrorTrace(e) => e.level(),
        }
    }

    fn render(&self, opts: &RenderOptions) -> &str {
        match self {
            Self::General(e) => e.render(opts),
            Self::ErrorTrace(e) => e.render(opts),
        }
    }
}

impl From<GeneralEvent> for LogEvent {
    fn from(event: GeneralEvent) -> Self {
        Self::General(event)
    }
}

impl From<ErrorTraceEvent> for LogEvent {
    fn from(event: ErrorTraceEvent) -> Self {
        Self::ErrorTrace(event)
    }
}

// =============================================================================
// Header
// =============================================================================

/// Fields common to both variants
#[derive(Debug, Clone)]
pub(crate) struct EventHeader {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    pub site: CallSite,
    /// Bare method name, present only when method display was on
    pub function: Option<&'static str>,
}

impl EventHeader {
    pub fn new(level: Severity, site: CallSite, show_method: bool) -> Self {
        let function = if show_method && !site.function.is_empty() {
            Some(bare_function_name(site.function))
        } else {
            None
        };
        Self {
            timestamp: Local::now(),
            level,
            site,
            function,
        }
    }

    /// `timestamp SEVERITY [location] ` prefix
    pub fn write_prefix(&self, out: &mut String, opts: &RenderOptions) {
        let _ = write!(
            out,
            "{} {} [{}] ",
            self.timestamp.format(LINE_TIMESTAMP_FORMAT),
            self.level.label(),
            self.location(opts)
        );
    }

    fn location(&self, opts: &RenderOptions) -> String {
        let source = compact_source(self.site.file);
        let location = match self.function {
            Some(function) if opts.show_method => {
                format!("{}.{}():{}", source, function, self.site.line)
            }
            _ => format!("{}:{}", source, self.site.line),
        };
        fit_width(&location, opts.print_width)
    }
}

// =============================================================================
// Source paths
// =============================================================================

/// Path segments after the last project-root marker, if there is one
fn segments_after_root(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
    let root = segments.iter().rposition(|s| *s == SOURCE_ROOT_MARKER)?;
    let rest = &segments[root + 1..];
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_vec())
    }
}

/// Location column form: `src/net/tcp/conn.rs` -> `n.t.conn`
pub fn compact_source(path: &str) -> String {
    let Some(segments) = segments_after_root(path) else {
        return path.to_string();
    };

    let mut out = String::with_capacity(path.len());
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        if i < last {
            if let Some(first) = segment.chars().next() {
                out.push(first);
            }
            out.push('.');
        } else {
            let stem = segment.rsplit_once('.').map_or(*segment, |(stem, _)| stem);
            out.push_str(stem);
        }
    }
    out
}

/// Trace frame form: `src/net/tcp/conn.rs` -> `net.tcp.conn.rs`
pub fn dotted_source(path: &str) -> String {
    match segments_after_root(path) {
        Some(segments) => segments.join("."),
        None => path.to_string(),
    }
}

/// Keep the rightmost `width` characters, or left-pad with spaces to `width`
pub fn fit_width(location: &str, width: usize) -> String {
    let len = location.chars().count();
    if len >= width {
        location.chars().skip(len - width).collect()
    } else {
        let mut out = String::with_capacity(width);
        out.extend(std::iter::repeat(' ').take(width - len));
        out.push_str(location);
        out
    }
}
