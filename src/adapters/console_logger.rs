//! Console logger.
//!
//! A minimal [`log::Log`] backend writing one line per record to stderr:
//!
//! ```text
//! [   12.345 INFO  hackerboat::fsm] Boat transition: SelfTest -> Disarmed
//! ```
//!
//! The level comes from `HACKERBOAT_LOG` (`error` .. `trace`), default
//! `info`.

use std::io::Write;
use std::str::FromStr;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub const LEVEL_ENV: &str = "HACKERBOAT_LOG";

pub struct ConsoleLogger {
    level: LevelFilter,
    start: Instant,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            start: Instant::now(),
        }
    }

    fn format(&self, record: &Record) -> String {
        let t = self.start.elapsed();
        format!(
            "[{:>5}.{:03} {:<5} {}] {}",
            t.as_secs(),
            t.subsec_millis(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = self.format(record);
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Level named by `value`, or `Info` when unset or unrecognised.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the console logger as the global `log` backend.
pub fn init() -> Result<(), SetLoggerError> {
    let level = level_from(std::env::var(LEVEL_ENV).ok().as_deref());
    log::set_boxed_logger(Box::new(ConsoleLogger::new(level)))?;
    log::set_max_level(level);
    Ok(())
}
