use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Custom logger structure
#[derive(Debug)]
struct BridgeLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() <= self.level {
            // Debug/trace records are limited to the requested topics
            if let Some(filters) = &self.debug_filters {
                if metadata.level() == log::Level::Debug || metadata.level() == log::Level::Trace {
                    return filters.contains(metadata.target())
                        || filters.iter().any(|f| metadata.target().starts_with(f));
                }
            }
            return true;
        }
        false
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m", // Red
            log::Level::Warn => "\x1B[33m",  // Yellow
            log::Level::Info => "\x1B[32m",  // Green
            log::Level::Debug => "\x1B[36m", // Cyan
            log::Level::Trace => "\x1B[35m", // Magenta
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let message = record.args().to_string();
        let context = match entity_context(&message) {
            Some(id) => format!("[{}] ", id),
            None => String::new(),
        };

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {context}{target}: {message}",
            level = record.level(),
            target = record.target(),
        );

        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // A closed stdout is not worth crashing the engine over
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{}", output);
        let _ = stdout.flush();
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Extracts the first "entity eN" reference from a log message, if any
fn entity_context(message: &str) -> Option<&str> {
    let idx = message.find("entity e")?;
    let rest = &message[idx + "entity ".len()..];
    let digits = rest[1..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len() - 1);
    if digits == 0 {
        return None;
    }
    Some(&rest[..=digits])
}

static LOGGER: OnceLock<BridgeLogger> = OnceLock::new();

/// Initialize the global logger with optional comma-separated debug topics.
///
/// When `RUST_LOG` is set it wins and `env_logger` is installed instead, so
/// dependency crates can be filtered with the usual syntax.
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    if std::env::var_os("RUST_LOG").is_some() {
        return env_logger::Builder::from_default_env().try_init();
    }

    let debug_filters = parse_filters(debug_filter);
    let logger = LOGGER.get_or_init(|| BridgeLogger {
        level,
        debug_filters,
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

fn parse_filters(debug_filter: Option<String>) -> Option<HashSet<String>> {
    debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    })
}

/// Maps a `--log-level` argument to a filter; unknown values fall back to info
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

// Helper macros for specific debug topics
#[macro_export]
macro_rules! debug_bridge {
    ($($arg:tt)*) => {
        log::debug!(target: "bridge", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_world {
    ($($arg:tt)*) => {
        log::debug!(target: "world", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_render {
    ($($arg:tt)*) => {
        log::debug!(target: "render", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_events {
    ($($arg:tt)*) => {
        log::debug!(target: "events", "{}", format_args!($($arg)*))
    };
}
