//! The single write path
//!
//! `Sink` renders an event, writes it to stdout or the rotating file, and
//! forwards attached errors to the reporter. In synchronous mode it is
//! called from producer threads; the output mutex then covers a rotation
//! together with the write that triggered it. In asynchronous mode only
//! the writer thread calls it.

use crate::config::RuntimeSettings;
use crate::event::{LogEvent, Loggable};
use crate::file::RotatingFile;
use crate::report::{NoopReporter, Reporter, ReportingConfig};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination of rendered lines
#[derive(Debug)]
pub enum Output {
    Stdout,
    File(RotatingFile),
}

impl Output {
    pub fn write(&mut self, text: &str, day: NaiveDate) {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
                    debug!("Failed to write to stdout: {}", e);
                }
            }
            Self::File(file) => file.write(text, day),
        }
    }
}

pub struct Sink {
    output: Mutex<Output>,
    settings: RwLock<RuntimeSettings>,
    reporting: RwLock<ReportingConfig>,
    reporter: RwLock<Arc<dyn Reporter>>,
}

impl Sink {
    pub fn new(output: Output, settings: RuntimeSettings) -> Self {
        Self {
            output: Mutex::new(output),
            settings: RwLock::new(settings),
            reporting: RwLock::new(ReportingConfig::default()),
            reporter: RwLock::new(Arc::new(NoopReporter)),
        }
    }

    /// Render, write, then report
    ///
    /// A panic raised by host code on the way (an error's `Display`, the
    /// reporter) is caught and dropped with the event.
    pub fn write(&self, event: &LogEvent) {
        let written = panic::catch_unwind(AssertUnwindSafe(|| self.write_event(event)));
        if written.is_err() {
            warn!("Panic while writing a {} event, event dropped", event.level());
        }
    }

    fn write_event(&self, event: &LogEvent) {
        let opts = self.settings.read().render_options();
        let text = event.render(&opts);
        let day = event.timestamp().date_naive();

        self.output.lock().write(text, day);

        if let Some(origin) = event.error() {
            let level = event.level();
            if self.reporting.read().accepts(level) {
                let reporter = self.reporter.read().clone();
                reporter.report(level, origin.error());
            }
        }
    }

    // === Settings ===

    pub fn settings(&self) -> RuntimeSettings {
        *self.settings.read()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut RuntimeSettings)) {
        f(&mut self.settings.write());
    }

    /// Run `f` against the rotating file, if the output is a file
    pub fn with_file<R>(&self, f: impl FnOnce(&mut RotatingFile) -> R) -> Option<R> {
        match &mut *self.output.lock() {
            Output::File(file) => Some(f(file)),
            Output::Stdout => None,
        }
    }

    // === Reporting ===

    pub fn reporting(&self) -> ReportingConfig {
        self.reporting.read().clone()
    }

    /// Change the reporting config and let the reporter know when configured
    pub fn update_reporting(&self, f: impl FnOnce(&mut ReportingConfig)) {
        let config = {
            let mut reporting = self.reporting.write();
            f(&mut reporting);
            reporting.clone()
        };
        if config.is_configured() {
            self.reporter.read().configure(&config);
        }
    }

    pub fn set_reporter(&self, reporter: Arc<dyn Reporter>) {
        let config = self.reporting();
        if config.is_configured() {
            reporter.configure(&config);
        }
        *self.reporter.write() = reporter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callsite::CallSite;
    use crate::config::Preference;
    use crate::event::{ErrorTraceEvent, ErrorValue, GeneralEvent, Payload};
    use crate::level::Severity;
    use std::error::Error;
    use std::fs;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<(Severity, String)>>,
        configured: Mutex<Vec<String>>,
    }

    impl Reporter for RecordingReporter {
        fn report(&self, severity: Severity, error: &(dyn Error + Send + Sync + 'static)) {
            self.reports.lock().push((severity, error.to_string()));
        }

        fn configure(&self, config: &ReportingConfig) {
            self.configured.lock().push(config.endpoint.clone());
        }
    }

    struct PanickingReporter;

    impl Reporter for PanickingReporter {
        fn report(&self, _severity: Severity, _error: &(dyn Error + Send + Sync + 'static)) {
            panic!("reporter failed");
        }
    }

    #[derive(Debug)]
    struct UnprintableError;

    impl std::fmt::Display for UnprintableError {
        fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            panic!("display failed");
        }
    }

    impl Error for UnprintableError {}

    fn unique_temp_dir() -> PathBuf {
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = base.join(format!("daylog-output-{}-{}", pid, ts));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_sink(dir: &PathBuf) -> Sink {
        let settings = RuntimeSettings::from(&Preference::default());
        Sink::new(Output::File(RotatingFile::new(dir, "app", 90)), settings)
    }

    fn error_event(level: Severity) -> LogEvent {
        ErrorTraceEvent::with_frames(
            level,
            CallSite::new("src/main.rs", 3, "app::main"),
            None,
            ErrorValue::new(std::io::Error::new(std::io::ErrorKind::Other, "io down")),
            true,
            Vec::new(),
        )
        .into()
    }

    #[test]
    fn test_write_appends_rendered_line() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        let event: LogEvent = GeneralEvent::new(
            Severity::Info,
            CallSite::new("src/main.rs", 9, "app::main"),
            Payload::Message("hello".to_string()),
            true,
        )
        .into();

        sink.write(&event);

        let content = fs::read_to_string(dir.join("app.log")).unwrap();
        assert!(content.ends_with("hello\n"));
        assert!(content.contains(" INFO  ["));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rotation_uses_event_day() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        let today = chrono::Local::now();
        let tomorrow = today + chrono::Duration::days(1);

        let first: LogEvent = GeneralEvent::new(
            Severity::Info,
            CallSite::new("src/main.rs", 1, "app::main"),
            Payload::Message("today".to_string()),
            true,
        )
        .into();
        let second = LogEvent::from(GeneralEvent::new(
            Severity::Info,
            CallSite::new("src/main.rs", 2, "app::main"),
            Payload::Message("tomorrow".to_string()),
            true,
        ))
        .with_timestamp(tomorrow);

        sink.write(&first);
        sink.write(&second);

        let day = sink.with_file(|f| f.current_day()).flatten();
        assert_eq!(day, Some(tomorrow.date_naive()));
        let active = fs::read_to_string(dir.join("app.log")).unwrap();
        assert!(active.ends_with("tomorrow\n"));
        assert!(!active.contains("today\n"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reporter_receives_error_once() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        let reporter = Arc::new(RecordingReporter::default());
        sink.set_reporter(reporter.clone());

        sink.write(&error_event(Severity::Error));

        let reports = reporter.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0], (Severity::Error, "io down".to_string()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reporter_skips_verbose_levels() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        let reporter = Arc::new(RecordingReporter::default());
        sink.set_reporter(reporter.clone());

        sink.write(&error_event(Severity::Info));
        sink.write(&error_event(Severity::Debug));

        assert!(reporter.reports.lock().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_panicking_error_display_is_contained() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        let broken: LogEvent = ErrorTraceEvent::with_frames(
            Severity::Error,
            CallSite::new("src/main.rs", 4, "app::main"),
            None,
            ErrorValue::new(UnprintableError),
            true,
            Vec::new(),
        )
        .into();

        sink.write(&broken);
        sink.write(&GeneralEvent::new(
            Severity::Info,
            CallSite::new("src/main.rs", 5, "app::main"),
            Payload::Message("still writing".to_string()),
            true,
        )
        .into());

        let content = fs::read_to_string(dir.join("app.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with("still writing\n"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_panicking_reporter_keeps_line() {
        let dir = unique_temp_dir();
        let sink = file_sink(&dir);
        sink.set_reporter(Arc::new(PanickingReporter));

        sink.write(&error_event(Severity::Error));
        sink.write(&error_event(Severity::Warn));

        let content = fs::read_to_string(dir.join("app.log")).unwrap();
        assert_eq!(content.matches("io down").count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_configure_called_only_for_real_endpoint() {
        let sink = Sink::new(
            Output::Stdout,
            RuntimeSettings::from(&Preference::default()),
        );
        let reporter = Arc::new(RecordingReporter::default());
        sink.set_reporter(reporter.clone());

        sink.update_reporting(|r| r.endpoint = "short".to_string());
        assert!(reporter.configured.lock().is_empty());

        sink.update_reporting(|r| r.endpoint = "https://key@reports.example.com/1".to_string());
        assert_eq!(reporter.configured.lock().len(), 1);
    }
}
