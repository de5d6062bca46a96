//! Error event with a captured call stack

use super::{dotted_source, ErrorValue, EventHeader, Loggable, Payload, RenderOptions};
use crate::callsite::{bare_function_name, capture_trace, CallSite, TraceFrame};
use crate::level::Severity;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::sync::OnceLock;

/// General line followed by a `TRACE <<<` block, one line per frame
#[derive(Debug)]
pub struct ErrorTraceEvent {
    pub(crate) header: EventHeader,
    payload: Option<Payload>,
    origin: ErrorValue,
    frames: Vec<TraceFrame>,
    /// No message was given: the error itself is the payload
    announce: bool,
    rendered: OnceLock<String>,
}

impl ErrorTraceEvent {
    /// Build the event and capture up to `max_depth` frames of the current stack
    pub fn capture(
        level: Severity,
        site: CallSite,
        payload: Option<Payload>,
        origin: ErrorValue,
        show_method: bool,
        max_depth: usize,
    ) -> Self {
        let frames = capture_trace(max_depth);
        Self::with_frames(level, site, payload, origin, show_method, frames)
    }

    /// Build the event from frames captured elsewhere
    pub fn with_frames(
        level: Severity,
        site: CallSite,
        payload: Option<Payload>,
        origin: ErrorValue,
        show_method: bool,
        frames: Vec<TraceFrame>,
    ) -> Self {
        Self {
            header: EventHeader::new(level, site, show_method),
            announce: payload.is_none(),
            payload,
            origin,
            frames,
            rendered: OnceLock::new(),
        }
    }

    pub fn origin_error(&self) -> &ErrorValue {
        &self.origin
    }

    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    pub fn is_announce(&self) -> bool {
        self.announce
    }

    fn write_trace(&self, out: &mut String) {
        if !self.announce {
            let _ = writeln!(out, "\t{}", self.origin);
        }
        out.push_str("\tTRACE <<<\n");
        for frame in &self.frames {
            let _ = writeln!(
                out,
                "\t[{}(), {}:{}]",
                bare_function_name(&frame.function),
                dotted_source(&frame.file),
                frame.line
            );
        }
    }
}

impl Loggable for ErrorTraceEvent {
    fn timestamp(&self) -> DateTime<Local> {
        self.header.timestamp
    }

    fn level(&self) -> Severity {
        self.header.level
    }

    fn render(&self, opts: &RenderOptions) -> &str {
        self.rendered.get_or_init(|| {
            let mut text = String::with_capacity(128 + self.frames.len() * 64);
            self.header.write_prefix(&mut text, opts);
            match &self.payload {
                Some(payload) => payload.write_to(&mut text),
                None => {
                    let _ = write!(text, "{}", self.origin);
                }
            }
            text.push('\n');
            self.write_trace(&mut text);
            text
        })
    }
}
