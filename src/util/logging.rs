use env_logger::{Builder, Target};
use log::{LevelFilter, SetLoggerError};
use std::io::Write;

use crate::config::LogLevel;

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

// Logs go to stderr; stdout carries the write report.
fn builder(level: &LogLevel) -> Builder {
    let mut builder = Builder::new();
    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, LevelFilter::from(*level));
    builder
}

/// Initialize the logging system
///
/// Panics if a logger is already installed.
pub fn init(level: &LogLevel) {
    builder(level).init();
}

/// Initialize the logging system, failing if a logger is already installed
pub fn try_init(level: &LogLevel) -> Result<(), SetLoggerError> {
    builder(level).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::Error);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::Info);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
    }

    #[test]
    fn test_second_init_fails() {
        let _ = try_init(&LogLevel::Debug);
        assert!(try_init(&LogLevel::Debug).is_err());
    }
}
