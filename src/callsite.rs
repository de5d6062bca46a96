//! Call-site and stack-frame resolution
//!
//! The emission macros capture `file!()`, `line!()` and the enclosing
//! function path at compile time. Error traces walk the live stack with
//! the `backtrace` crate and resolve each program counter to a frame.

use std::ffi::c_void;

/// Symbol prefixes that belong to the capture machinery itself
const INTERNAL_PREFIXES: [&str; 5] = [
    "backtrace::",
    "daylog::callsite::",
    "daylog::event::",
    "daylog::logger::Logger",
    "<daylog::",
];

/// Extra frames walked to get past the capture machinery
const WALK_HEADROOM: usize = 32;

/// Where an emission macro was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    /// Fully qualified path of the enclosing function
    pub function: &'static str,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Caller location for non-macro entry points (no function name)
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            function: "",
        }
    }
}

/// One resolved frame of an error trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub pc: usize,
    /// Symbol path without the trailing hash
    pub function: String,
    pub file: String,
    pub line: u32,
}

/// Resolve a program counter to a frame
///
/// Returns `None` when the platform has no symbol for `pc`.
pub fn resolve(pc: usize) -> Option<TraceFrame> {
    let mut resolved = None;
    backtrace::resolve(pc as *mut c_void, |symbol| {
        if resolved.is_none() {
            resolved = frame_from_symbol(pc, symbol);
        }
    });
    resolved
}

/// Walk the current stack, caller first, collecting at most `max_depth` frames
///
/// Frames up to the outermost one of the logging machinery are skipped.
/// Capture stops early at the first frame that cannot be resolved.
pub fn capture_trace(max_depth: usize) -> Vec<TraceFrame> {
    if max_depth == 0 {
        return Vec::new();
    }

    let limit = max_depth + WALK_HEADROOM;
    let mut walked: Vec<Option<TraceFrame>> = Vec::with_capacity(limit.min(64));
    backtrace::trace(|frame| {
        let pc = frame.ip() as usize;
        let mut resolved = None;
        backtrace::resolve_frame(frame, |symbol| {
            if resolved.is_none() {
                resolved = frame_from_symbol(pc, symbol);
            }
        });
        walked.push(resolved);
        walked.len() < limit
    });

    let start = walked
        .iter()
        .rposition(|f| f.as_ref().is_some_and(|f| is_internal(&f.function)))
        .map_or(0, |i| i + 1);

    walked
        .into_iter()
        .skip(start)
        .map_while(|f| f)
        .take(max_depth)
        .collect()
}

fn frame_from_symbol(pc: usize, symbol: &backtrace::Symbol) -> Option<TraceFrame> {
    let name = symbol.name()?;
    Some(TraceFrame {
        pc,
        function: format!("{:#}", name),
        file: symbol
            .filename()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<unknown>".to_string()),
        line: symbol.lineno().unwrap_or(0),
    })
}

fn is_internal(function: &str) -> bool {
    !function.contains("::tests::") && INTERNAL_PREFIXES.iter().any(|p| function.starts_with(p))
}

/// Bare method name: the segment after the last `::`, ignoring closures
pub fn bare_function_name(path: &str) -> &str {
    let mut trimmed = path;
    while let Some(rest) = trimmed.strip_suffix("::{{closure}}") {
        trimmed = rest;
    }
    trimmed.rsplit("::").next().unwrap_or(trimmed)
}
