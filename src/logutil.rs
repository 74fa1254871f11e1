//! Logging helpers: single-line escaping of user-supplied strings (names,
//! attribute values, specs) and `env_logger` setup for the binary.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Arc, Mutex};

use log::LevelFilter;

use crate::config::LoggingConfig;

const MAX_PREVIEW: usize = 200;

/// Escape a string for single-line logging.
///
/// Backslash, newline, carriage return and tab become two-character escapes,
/// other control characters become `\xNN`, and anything past the preview
/// length is cut off with an ellipsis. Attribute values can hold whole JSON
/// documents, so the cut matters.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Log level from the `-v` count, falling back to the configured level when no
/// `-v` was given.
pub fn base_level(configured: Option<&str>, verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => configured
            .and_then(|level| level.trim().parse().ok())
            .unwrap_or(LevelFilter::Info),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger. Lines look like `2025-01-01T00:00:00Z [INFO] msg`.
/// With a log file configured every line is appended there, and echoed to the
/// console only when stdout is a terminal.
pub fn init_logging(config: Option<&LoggingConfig>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(base_level(
        config.map(|c| c.level.as_str()),
        verbosity,
    ));

    let log_file = config
        .and_then(|c| c.file.as_ref())
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());

    match log_file {
        Some(file) => {
            let file = Arc::new(Mutex::new(file));
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("a\nb\r\tc\\"), "a\\nb\\r\\tc\\\\");
        assert_eq!(escape_log("bell\u{7}"), "bell\\x07");
    }

    #[test]
    fn truncates_long_values() {
        let long = "x".repeat(MAX_PREVIEW + 50);
        let escaped = escape_log(&long);
        assert!(escaped.ends_with('…'));
        assert_eq!(escaped.chars().count(), MAX_PREVIEW + 1);
    }

    #[test]
    fn verbosity_overrides_configured_level() {
        assert_eq!(base_level(Some("warn"), 0), LevelFilter::Warn);
        assert_eq!(base_level(Some("nonsense"), 0), LevelFilter::Info);
        assert_eq!(base_level(None, 0), LevelFilter::Info);
        assert_eq!(base_level(Some("warn"), 1), LevelFilter::Debug);
        assert_eq!(base_level(Some("warn"), 3), LevelFilter::Trace);
    }
}
