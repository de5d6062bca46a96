//! Plain message event

use super::{EventHeader, Loggable, Payload, RenderOptions};
use crate::callsite::CallSite;
use crate::level::Severity;
use chrono::{DateTime, Local};
use std::sync::OnceLock;

/// `timestamp SEVERITY [location] message`
#[derive(Debug)]
pub struct GeneralEvent {
    pub(crate) header: EventHeader,
    payload: Payload,
    rendered: OnceLock<String>,
}

impl GeneralEvent {
    pub fn new(level: Severity, site: CallSite, payload: Payload, show_method: bool) -> Self {
        Self {
            header: EventHeader::new(level, site, show_method),
            payload,
            rendered: OnceLock::new(),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn site(&self) -> &CallSite {
        &self.header.site
    }
}

impl Loggable for GeneralEvent {
    fn timestamp(&self) -> DateTime<Local> {
        self.header.timestamp
    }

    fn level(&self) -> Severity {
        self.header.level
    }

    fn render(&self, opts: &RenderOptions) -> &str {
        self.rendered.get_or_init(|| {
            let mut line = String::with_capacity(96);
            self.header.write_prefix(&mut line, opts);
            self.payload.write_to(&mut line);
            line.push('\n');
            line
        })
    }
}
