//! Crate-wide constants
//!
//! Defaults, lower bounds for the runtime mutators, and timing values.

// =============================================================================
// Preference defaults
// =============================================================================

/// Days a rotated backup file is kept before pruning
pub const DEFAULT_KEEPING_FILE_DAYS: u16 = 90;

/// Width of the `[source-location]` column
pub const DEFAULT_SOURCE_PRINT_WIDTH: usize = 30;

/// Maximum frames captured for an error trace
pub const DEFAULT_MAX_TRACE_DEPTH: usize = 10;

// =============================================================================
// Floors
// =============================================================================

/// Below this the retention setter is ignored
pub const MIN_KEEPING_FILE_DAYS: u16 = 2;

/// Below this the print width setter is ignored
pub const MIN_SOURCE_PRINT_WIDTH: usize = 10;

/// Trace depth below this is normalized back to the default
pub const MIN_MAX_TRACE_DEPTH: usize = 3;

/// Below this the file-size limit setter is ignored
pub const MIN_FILE_SIZE_LIMIT_MB: u16 = 1;

/// Reporting endpoints shorter than this count as unconfigured
pub const MIN_REPORTING_ENDPOINT_LEN: usize = 8;

// =============================================================================
// Delivery
// =============================================================================

/// Capacity of the asynchronous delivery queue
pub const QUEUE_CAPACITY: usize = 1024;

/// Name of the consumer thread in asynchronous mode
pub const WRITER_THREAD_NAME: &str = "daylog-writer";

/// Name of the background retention thread
pub const PRUNE_THREAD_NAME: &str = "daylog-prune";

// =============================================================================
// Files
// =============================================================================

/// Extension shared by the active file and backups
pub const LOG_FILE_EXTENSION: &str = "log";

/// Date stamp embedded in backup file names
pub const BACKUP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp column of every log line
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Path segment that marks the project root in source paths
pub const SOURCE_ROOT_MARKER: &str = "src";
