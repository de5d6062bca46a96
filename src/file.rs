//! Daily rotating log file
//!
//! The active file lives at `<dir>/<name>.log`. When a line stamped with a
//! later calendar day arrives, the active file is closed, renamed to
//! `<dir>/<name>.<YYYY-MM-DD>.log` (date taken from its modification time),
//! and a fresh file is opened. Expired backups are pruned on a background
//! thread.
//!
//! Every method takes `&mut self`: callers serialize access, either by being
//! the single writer thread or by holding the output mutex.

use crate::constants::{BACKUP_DATE_FORMAT, LOG_FILE_EXTENSION, PRUNE_THREAD_NAME};
use crate::error::{LogError, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// Handle lifecycle: Unopened -> Open -> (rotate) -> Open
#[derive(Debug)]
enum FileState {
    Unopened,
    Open { file: File, day: NaiveDate },
    /// The target cannot be used as a log file; lines are discarded
    Disabled,
}

#[derive(Debug)]
pub struct RotatingFile {
    dir: PathBuf,
    process_name: String,
    path: PathBuf,
    keeping_days: u16,
    state: FileState,
}

impl RotatingFile {
    pub fn new(dir: impl Into<PathBuf>, process_name: impl Into<String>, keeping_days: u16) -> Self {
        let dir = dir.into();
        let process_name = process_name.into();
        let path = dir.join(format!("{}.{}", process_name, LOG_FILE_EXTENSION));
        Self {
            dir,
            process_name,
            path,
            keeping_days,
            state: FileState::Unopened,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Day stamp of the active file, if one is open
    pub fn current_day(&self) -> Option<NaiveDate> {
        match &self.state {
            FileState::Open { day, .. } => Some(*day),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, FileState::Disabled)
    }

    pub fn set_keeping_days(&mut self, days: u16) {
        self.keeping_days = days;
    }

    /// Write `text` as belonging to calendar day `day`, rotating first if needed
    pub fn write(&mut self, text: &str, day: NaiveDate) {
        self.ensure_open();
        self.ensure_day(day);

        if let FileState::Open { file, .. } = &mut self.state {
            if let Err(e) = file.write_all(text.as_bytes()) {
                warn!("Failed to write {}: {}", self.path.display(), e);
            }
        }
    }

    /// Prune expired backups on a background thread
    pub fn prune_in_background(&self) {
        spawn_prune(
            self.dir.clone(),
            self.process_name.clone(),
            self.keeping_days,
        );
    }

    fn ensure_open(&mut self) {
        if !matches!(self.state, FileState::Unopened) {
            return;
        }

        self.state = match fs::metadata(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => match open_append(&self.path) {
                Ok(file) => FileState::Open {
                    file,
                    day: Local::now().date_naive(),
                },
                Err(e) => {
                    warn!("{}", e);
                    FileState::Disabled
                }
            },
            Err(e) => {
                warn!("Failed to stat {}: {}", self.path.display(), e);
                FileState::Disabled
            }
            Ok(meta) if meta.is_dir() => {
                warn!(
                    "{} exists as a directory, file logging disabled",
                    self.path.display()
                );
                FileState::Disabled
            }
            Ok(_) => match open_append(&self.path) {
                Ok(file) => {
                    let day = modified_day(&self.path).unwrap_or_else(|| Local::now().date_naive());
                    FileState::Open { file, day }
                }
                Err(e) => {
                    warn!("{}", e);
                    FileState::Disabled
                }
            },
        };
    }

    /// Rotate when `day` is later than the active file's day
    ///
    /// A line stamped before the active day (taken just before midnight,
    /// written just after) is appended to the active file.
    fn ensure_day(&mut self, day: NaiveDate) {
        if let Some(current) = self.current_day() {
            if day > current {
                self.rotate(current, day);
            }
        }
    }

    /// Close -> rename -> reopen
    ///
    /// If the rename fails the old file is reopened for append and keeps its
    /// stale day stamp, so the next write retries the rotation.
    fn rotate(&mut self, current: NaiveDate, next: NaiveDate) {
        // Close the active handle before touching the path
        self.state = FileState::Unopened;

        let stamp = modified_day(&self.path).unwrap_or(current);
        let backup = backup_path(&self.dir, &self.process_name, stamp);

        if let Err(e) = move_to_backup(&self.path, &backup) {
            warn!("{}, will retry on next write", e);
            self.state = match open_append(&self.path) {
                Ok(file) => FileState::Open { file, day: current },
                Err(e) => {
                    warn!("{}", e);
                    FileState::Unopened
                }
            };
            return;
        }
        debug!("Rotated {} -> {}", self.path.display(), backup.display());

        self.prune_in_background();

        self.state = match open_append(&self.path) {
            Ok(file) => FileState::Open { file, day: next },
            Err(e) => {
                warn!("{}", e);
                FileState::Unopened
            }
        };
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

fn modified_day(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// `<dir>/<name>.<YYYY-MM-DD>.log`
pub fn backup_path(dir: &Path, process_name: &str, day: NaiveDate) -> PathBuf {
    dir.join(format!(
        "{}.{}.{}",
        process_name,
        day.format(BACKUP_DATE_FORMAT),
        LOG_FILE_EXTENSION
    ))
}

/// Rename the active file, or append it to an existing backup of the same day
fn move_to_backup(active: &Path, backup: &Path) -> Result<()> {
    if !backup.exists() {
        return fs::rename(active, backup).map_err(|e| LogError::Io {
            path: backup.to_path_buf(),
            source: e,
        });
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| LogError::Io { path, source }
    };
    let mut src = File::open(active).map_err(io_err(active))?;
    let mut dst = OpenOptions::new()
        .append(true)
        .open(backup)
        .map_err(io_err(backup))?;
    io::copy(&mut src, &mut dst).map_err(io_err(backup))?;
    drop(src);
    fs::remove_file(active).map_err(io_err(active))
}

/// Date embedded in `<name>.<YYYY-MM-DD>.log`, if `file_name` is such a backup
pub fn parse_backup_date(file_name: &str, process_name: &str) -> Option<NaiveDate> {
    let rest = file_name.strip_prefix(process_name)?.strip_prefix('.')?;
    let date = rest
        .strip_suffix(LOG_FILE_EXTENSION)?
        .strip_suffix('.')?;
    NaiveDate::parse_from_str(date, BACKUP_DATE_FORMAT).ok()
}

/// Delete backups whose embedded date is before `now - keeping_days`
///
/// Returns the number of files removed. Unreadable entries and malformed
/// names are skipped.
pub fn prune_expired(
    dir: &Path,
    process_name: &str,
    keeping_days: u16,
    now: DateTime<Local>,
) -> usize {
    if keeping_days < 1 {
        return 0;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to scan {}: {}", dir.display(), e);
            return 0;
        }
    };

    let deadline = (now - Duration::days(i64::from(keeping_days))).naive_local();
    let mut removed = 0;

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(date) = parse_backup_date(name, process_name) else {
            continue;
        };
        let Some(created) = date.and_hms_opt(0, 0, 0) else {
            continue;
        };

        if created < deadline {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", entry.path().display(), e),
            }
        }
    }

    removed
}

fn spawn_prune(dir: PathBuf, process_name: String, keeping_days: u16) {
    let spawned = thread::Builder::new()
        .name(PRUNE_THREAD_NAME.to_string())
        .spawn(move || {
            let removed = prune_expired(&dir, &process_name, keeping_days, Local::now());
            if removed > 0 {
                debug!("Removed {} expired log file(s)", removed);
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to spawn log pruning thread: {}", e);
    }
}
