#![cfg(feature = "std")]

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

/// Writes `[  secs] LEVEL target: message` lines to stderr, timed from the
/// first logged record.
struct StderrLogger {
    start: OnceLock<Instant>,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.start.get_or_init(Instant::now).elapsed();
        eprintln!(
            "[{:>9.3}] {:<5} {}: {}",
            elapsed.as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger {
    start: OnceLock::new(),
};

/// Level from the `BROADSIDE_LOG` environment variable, `info` if unset or
/// invalid.
pub fn env_level() -> LevelFilter {
    env::var("BROADSIDE_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the logger. `level` overrides `BROADSIDE_LOG` when given.
pub fn init_logging(level: Option<LevelFilter>) {
    let level = level.unwrap_or_else(env_level);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
