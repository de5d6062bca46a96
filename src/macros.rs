//! Emission macros
//!
//! Every macro takes the logger as its first argument, followed by one of:
//! - a format string and arguments: `info!(log, "x={}", 5)`
//! - an error, optionally with a message: `error!(log, err: e, "open {}", path)`
//! - a single value rendered with its type: `debug!(log, value: retries)`
//!
//! The threshold is checked before anything is formatted, so a disabled
//! call costs one atomic load. A call with no arguments emits nothing.

/// Fully qualified path of the enclosing function
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        match name.strip_suffix("::__here") {
            ::core::option::Option::Some(path) => path,
            ::core::option::Option::None => name,
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __call_site {
    () => {
        $crate::CallSite::new(
            ::core::file!(),
            ::core::line!(),
            $crate::__function_path!(),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($logger:expr, $level:expr $(,)?) => {{
        let _ = &$logger;
    }};
    ($logger:expr, $level:expr, err: $err:expr $(,)?) => {{
        let logger = &$logger;
        if logger.is_enabled($level) {
            logger.emit_error(
                $level,
                $crate::__call_site!(),
                ::core::option::Option::None,
                $crate::ErrorValue::new($err),
            );
        }
    }};
    ($logger:expr, $level:expr, err: $err:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        if logger.is_enabled($level) {
            logger.emit_error(
                $level,
                $crate::__call_site!(),
                ::core::option::Option::Some($crate::Payload::message(::core::format_args!($($arg)+))),
                $crate::ErrorValue::new($err),
            );
        }
    }};
    ($logger:expr, $level:expr, value: $value:expr $(,)?) => {{
        let logger = &$logger;
        if logger.is_enabled($level) {
            logger.emit($level, $crate::__call_site!(), $crate::Payload::value(&$value));
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        if logger.is_enabled($level) {
            logger.emit(
                $level,
                $crate::__call_site!(),
                $crate::Payload::message(::core::format_args!($($arg)+)),
            );
        }
    }};
}

#[macro_export]
macro_rules! error {
    ($logger:expr $(, $($rest:tt)*)?) => {
        $crate::__emit!($logger, $crate::Severity::Error $(, $($rest)*)?)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $($rest:tt)*)?) => {
        $crate::__emit!($logger, $crate::Severity::Warn $(, $($rest)*)?)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr $(, $($rest:tt)*)?) => {
        $crate::__emit!($logger, $crate::Severity::Info $(, $($rest)*)?)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $($rest:tt)*)?) => {
        $crate::__emit!($logger, $crate::Severity::Debug $(, $($rest)*)?)
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr $(, $($rest:tt)*)?) => {
        $crate::__emit!($logger, $crate::Severity::Trace $(, $($rest)*)?)
    };
}

#[cfg(test)]
mod tests {
    use crate::config::{DeliveryMode, Preference};
    use crate::logger::Logger;
    use crate::Severity;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn unique_temp_dir() -> PathBuf {
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        base.join(format!("daylog-macros-{}-{}", pid, ts))
    }

    fn start(dir: &Path, level: Severity) -> Logger {
        Logger::start(
            Preference::new(dir)
                .with_process_name("app")
                .with_delivery(DeliveryMode::Sync)
                .with_level(level),
        )
    }

    fn read_log(dir: &Path) -> String {
        fs::read_to_string(dir.join("app.log")).unwrap_or_default()
    }

    #[test]
    fn test_function_path_names_enclosing_fn() {
        let path = __function_path!();
        assert!(path.ends_with("tests::test_function_path_names_enclosing_fn"));

        let in_closure = (|| __function_path!())();
        assert!(in_closure.contains("test_function_path_names_enclosing_fn::{{closure}}"));
    }

    #[test]
    fn test_format_message() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Trace);

        info!(log, "x={}", 5);

        let content = read_log(&dir);
        assert!(content.contains(" INFO  ["));
        assert!(content.contains("test_format_message():"));
        assert!(content.ends_with("] x=5\n"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_disabled_level_skips_formatting() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Warn);
        let mut evaluated = false;

        debug!(log, "{}", {
            evaluated = true;
            1
        });

        assert!(!evaluated);
        assert!(read_log(&dir).is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_call_emits_nothing() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Trace);

        warn!(log);
        warn!(log,);

        assert!(read_log(&dir).is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_value_payload() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Trace);
        let retries: u32 = 3;

        trace!(log, value: retries);

        assert!(read_log(&dir).ends_with("(u32) :: 3\n"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_error_with_message() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Trace);
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");

        error!(log, err: err, "open {}", "config.toml");

        let content = read_log(&dir);
        let mut lines = content.lines();
        assert!(lines.next().unwrap().ends_with("open config.toml"));
        assert!(lines.next().unwrap().ends_with(":: no such file"));
        assert_eq!(lines.next(), Some("\tTRACE <<<"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_error_only_announces() {
        let dir = unique_temp_dir();
        let log = start(&dir, Severity::Trace);

        error!(log, err: std::fmt::Error);

        let content = read_log(&dir);
        let mut lines = content.lines();
        assert!(lines
            .next()
            .unwrap()
            .ends_with("(core::fmt::Error) :: an error occurred when formatting an argument"));
        assert_eq!(lines.next(), Some("\tTRACE <<<"));

        let _ = fs::remove_dir_all(&dir);
    }
}
