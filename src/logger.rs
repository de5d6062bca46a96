//! Logger lifecycle
//!
//! `Logger` is the explicit context object of the pipeline: it owns the
//! threshold, the delivery mode and the write path. Lifecycle is
//! `NotStarted -> Running -> Shutdown`; only a running logger emits.

use crate::callsite::CallSite;
use crate::config::{DeliveryMode, Preference, RuntimeSettings, StreamMode};
use crate::constants::{
    MIN_FILE_SIZE_LIMIT_MB, MIN_KEEPING_FILE_DAYS, MIN_MAX_TRACE_DEPTH, MIN_SOURCE_PRINT_WIDTH,
    QUEUE_CAPACITY,
};
use crate::event::{ErrorTraceEvent, ErrorValue, GeneralEvent, LogEvent, Payload};
use crate::file::RotatingFile;
use crate::level::{LevelRegistry, Severity};
use crate::output::{Output, Sink};
use crate::queue::{AsyncQueue, Delivery};
use crate::report::{Reporter, ReportingConfig};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    NotStarted = 1,
    Running = 2,
    Shutdown = 4,
}

impl Status {
    fn from_bits(bits: u8) -> Self {
        match bits {
            2 => Self::Running,
            4 => Self::Shutdown,
            _ => Self::NotStarted,
        }
    }
}

pub struct Logger {
    status: AtomicU8,
    level: LevelRegistry,
    // Fixed once the logger exists
    log_dir: PathBuf,
    stream: StreamMode,
    process_name: String,
    delivery_mode: DeliveryMode,
    default_level: Severity,
    sink: Arc<Sink>,
    delivery: OnceLock<Delivery>,
}

impl Logger {
    /// Build a logger from a preference; it emits nothing until `initialize`
    pub fn new(mut pref: Preference) -> Self {
        pref.normalize();

        let output = match pref.stream {
            StreamMode::File => Output::File(RotatingFile::new(
                &pref.log_dir,
                &pref.process_name,
                pref.keeping_file_days,
            )),
            StreamMode::Stdout => Output::Stdout,
        };

        Self {
            status: AtomicU8::new(Status::NotStarted as u8),
            level: LevelRegistry::new(Severity::None),
            sink: Arc::new(Sink::new(output, RuntimeSettings::from(&pref))),
            log_dir: pref.log_dir,
            stream: pref.stream,
            process_name: pref.process_name,
            delivery_mode: pref.delivery,
            default_level: pref.default_level,
            delivery: OnceLock::new(),
        }
    }

    /// `new` followed by `initialize`
    ///
    /// File and rotation failures never reach the caller; they are reported
    /// through `tracing`. Call `daylog::init_diagnostics` (or install a
    /// subscriber) to see them.
    pub fn start(pref: Preference) -> Self {
        let logger = Self::new(pref);
        logger.initialize();
        logger
    }

    /// Start delivery and apply the default level
    ///
    /// Only the first call has an effect. If the writer thread cannot be
    /// spawned the logger falls back to synchronous delivery.
    pub fn initialize(&self) {
        if self
            .status
            .compare_exchange(
                Status::NotStarted as u8,
                Status::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let delivery = match self.delivery_mode {
            DeliveryMode::Sync => Delivery::Sync(self.sink.clone()),
            DeliveryMode::Async => match AsyncQueue::spawn(self.sink.clone(), QUEUE_CAPACITY) {
                Ok(queue) => Delivery::Async(queue),
                Err(e) => {
                    warn!("{}, using synchronous delivery", e);
                    Delivery::Sync(self.sink.clone())
                }
            },
        };
        let _ = self.delivery.set(delivery);

        self.level.set(self.default_level);
        debug!(
            "Logger started: {} ({:?}, {:?})",
            self.process_name, self.stream, self.delivery_mode
        );
    }

    /// Drain pending events and stop
    ///
    /// Blocks without a deadline until the queue is empty and no write is in
    /// flight; later emissions are ignored. A synchronous logger has nothing
    /// to drain: closing it is a no-op and it keeps logging.
    pub fn close(&self) {
        let Some(delivery) = self.delivery.get() else {
            return;
        };
        if !delivery.is_async() {
            return;
        }

        if self
            .status
            .compare_exchange(
                Status::Running as u8,
                Status::Shutdown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        delivery.shutdown();
    }

    pub fn status(&self) -> Status {
        Status::from_bits(self.status.load(Ordering::Acquire))
    }

    // =========================================================================
    // Fixed settings
    // =========================================================================

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn stream(&self) -> StreamMode {
        self.stream
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery_mode
    }

    // =========================================================================
    // Level
    // =========================================================================

    pub fn set_level(&self, level: Severity) {
        self.level.set(level);
    }

    pub fn level(&self) -> Severity {
        self.level.get()
    }

    /// `true` when running and `level` passes the threshold
    #[inline]
    pub fn is_enabled(&self, level: Severity) -> bool {
        self.status.load(Ordering::Acquire) == Status::Running as u8
            && self.level.is_enabled(level)
    }

    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled(Severity::Error)
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled(Severity::Warn)
    }

    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled(Severity::Info)
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled(Severity::Debug)
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled(Severity::Trace)
    }

    // =========================================================================
    // Runtime settings
    // =========================================================================

    pub fn settings(&self) -> RuntimeSettings {
        self.sink.settings()
    }

    /// Width of the location column (values below 10 are ignored)
    pub fn set_source_print_width(&self, width: usize) {
        if width < MIN_SOURCE_PRINT_WIDTH {
            return;
        }
        self.sink.update_settings(|s| s.source_print_width = width);
    }

    pub fn set_show_method(&self, show: bool) {
        self.sink.update_settings(|s| s.show_method = show);
    }

    /// Frames captured per error trace (values below 3 are ignored)
    pub fn set_max_trace_depth(&self, depth: usize) {
        if depth < MIN_MAX_TRACE_DEPTH {
            return;
        }
        self.sink.update_settings(|s| s.max_trace_depth = depth);
    }

    /// Backup retention in days
    ///
    /// Ignored for stdout loggers and values below 2. A change is logged and
    /// triggers a background prune.
    #[track_caller]
    pub fn set_keeping_file_days(&self, days: u16) {
        if days < MIN_KEEPING_FILE_DAYS || self.stream == StreamMode::Stdout {
            return;
        }

        let old = self.sink.settings().keeping_file_days;
        self.sink.update_settings(|s| s.keeping_file_days = days);
        self.sink.with_file(|f| f.set_keeping_days(days));

        if old != days {
            self.emit(
                Severity::Info,
                CallSite::caller(),
                Payload::message(format_args!("logging backup days changed to {}", days)),
            );
            self.sink.with_file(|f| f.prune_in_background());
        }
    }

    /// Accepted and recorded, never enforced
    #[track_caller]
    pub fn set_file_size_limit_mb(&self, mb: u16) {
        if mb < MIN_FILE_SIZE_LIMIT_MB || self.stream == StreamMode::Stdout {
            return;
        }

        self.sink.update_settings(|s| s.file_size_limit_mb = Some(mb));
        self.emit(
            Severity::Info,
            CallSite::caller(),
            Payload::message(format_args!(
                "[not yet supported] logging file size limit to {} MB",
                mb
            )),
        );
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub fn set_reporter(&self, reporter: Arc<dyn Reporter>) {
        self.sink.set_reporter(reporter);
    }

    pub fn set_reporting_endpoint(&self, endpoint: impl Into<String>, tags: HashMap<String, String>) {
        let endpoint = endpoint.into();
        self.sink.update_reporting(|r| {
            r.endpoint = endpoint;
            r.tags = tags;
        });
    }

    /// Most verbose severity still reported (only ERROR and WARN ever are)
    pub fn set_reporting_level(&self, level: Severity) {
        self.sink.update_reporting(|r| r.level = level);
    }

    pub fn set_reporting_flush_secs(&self, secs: u8) {
        if secs == 0 {
            return;
        }
        self.sink.update_reporting(|r| r.flush_secs = secs);
    }

    pub fn reporting(&self) -> ReportingConfig {
        self.sink.reporting()
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Emit a plain event; used by the level macros
    #[doc(hidden)]
    pub fn emit(&self, level: Severity, site: CallSite, payload: Payload) {
        if !self.is_enabled(level) {
            return;
        }
        let show_method = self.sink.settings().show_method;
        self.deliver(GeneralEvent::new(level, site, payload, show_method).into());
    }

    /// Emit an event carrying an error and a stack trace; used by the level macros
    #[doc(hidden)]
    pub fn emit_error(
        &self,
        level: Severity,
        site: CallSite,
        payload: Option<Payload>,
        error: ErrorValue,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let settings = self.sink.settings();
        let event = ErrorTraceEvent::capture(
            level,
            site,
            payload,
            error,
            settings.show_method,
            settings.max_trace_depth,
        );
        self.deliver(event.into());
    }

    fn deliver(&self, event: LogEvent) {
        if let Some(delivery) = self.delivery.get() {
            delivery.deliver(event);
        }
    }

    /// printf-style adapter emitting at a fixed severity
    pub fn printer(&self, level: Severity) -> LevelPrinter<'_> {
        LevelPrinter {
            logger: self,
            level,
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("status", &self.status())
            .field("level", &self.level())
            .field("stream", &self.stream)
            .field("process_name", &self.process_name)
            .field("delivery_mode", &self.delivery_mode)
            .finish()
    }
}

/// Emits every printed message at one severity
#[derive(Debug, Clone, Copy)]
pub struct LevelPrinter<'a> {
    logger: &'a Logger,
    level: Severity,
}

impl LevelPrinter<'_> {
    #[track_caller]
    pub fn print(&self, args: fmt::Arguments<'_>) {
        if self.logger.is_enabled(self.level) {
            self.logger
                .emit(self.level, CallSite::caller(), Payload::message(args));
        }
    }
}
