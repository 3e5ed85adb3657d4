//! Minimal logger.
//!
//! Records are formatted as `[elapsed LEVEL] message` and handed to a sink.
//! `init_with_level` writes to stderr with a monotonic clock; hosts without
//! `std::time::Instant` (the browser) install their own sink and clock with
//! `init_with_sink`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Receives one formatted log line.
pub type LogSink = fn(Level, &str);

/// Seconds since an arbitrary fixed origin.
pub type LogClock = fn() -> f64;

struct SimpleLogger {
    level: LevelFilter,
    sink: LogSink,
    clock: LogClock,
    started: f64,
}

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = (self.clock)() - self.started;
        let line = format!(
            "[{:7.3}s {:>5}] {}",
            elapsed,
            record.level(),
            record.args()
        );
        (self.sink)(record.level(), &line);
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<SimpleLogger> = OnceLock::new();
static ORIGIN: OnceLock<Instant> = OnceLock::new();

fn stderr_sink(_level: Level, line: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{line}");
}

fn monotonic_secs() -> f64 {
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Install the simple logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_sink(level, stderr_sink, monotonic_secs)
}

/// Install the simple logger with a custom sink and clock.
pub fn init_with_sink(
    level: LevelFilter,
    sink: LogSink,
    clock: LogClock,
) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| SimpleLogger {
            level,
            sink,
            clock,
            started: clock(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
