//! daylog - leveled logging with daily file rotation
//!
//! A `Logger` owns the whole pipeline:
//! - `level` - severity masks and the lock-free threshold
//! - `event` - general and error-trace events, rendered once
//! - `queue` - synchronous or bounded asynchronous delivery
//! - `file` - daily rotation and backup retention
//! - `report` - hand-off of logged errors to an external reporter
//!
//! Logging never fails its caller. I/O and rotation problems are reported
//! through `tracing` and stay silent unless the host installs a subscriber,
//! for example with `init_diagnostics`.
//!
//! ```no_run
//! use daylog::{info, DeliveryMode, Preference, Severity};
//!
//! daylog::init_diagnostics(false);
//! let log = daylog::init(
//!     Preference::new("/var/log/gateway")
//!         .with_delivery(DeliveryMode::Async)
//!         .with_level(Severity::Info),
//! );
//! info!(log, "listening on {}", 9000);
//! log.close();
//! ```

pub mod callsite;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod file;
pub mod level;
pub mod logger;
mod macros;
pub mod output;
pub mod queue;
pub mod report;

pub use callsite::{CallSite, TraceFrame};
pub use config::{DeliveryMode, Preference, RuntimeSettings, StreamMode};
pub use error::{LogError, Result};
pub use event::{ErrorTraceEvent, ErrorValue, GeneralEvent, LogEvent, Loggable, Payload};
pub use level::{LevelRegistry, Severity};
pub use logger::{LevelPrinter, Logger, Status};
pub use report::{NoopReporter, Reporter, ReportingConfig};

use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Start the process-wide logger
///
/// Only the first call builds a logger; later calls return that instance
/// and ignore their preference.
pub fn init(pref: Preference) -> &'static Logger {
    GLOBAL.get_or_init(|| Logger::start(pref))
}

/// The process-wide logger, if `init` has run
pub fn global() -> Option<&'static Logger> {
    GLOBAL.get()
}

/// Route the crate's own diagnostics (I/O failures, rotation problems)
///
/// Set `verbose` to true for debug-level output. A host that already
/// installed a subscriber keeps it.
pub fn init_diagnostics(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}
