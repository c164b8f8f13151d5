//! Log capture for unit tests
//!
//! A test binary gets one logger, so every test that asserts on a diagnostic
//! shares this one. Tests run in parallel: match on text only your test logs.

use std::sync::{Mutex, Once};

struct CaptureLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut records) = self.records.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

static INSTALL: Once = Once::new();

/// Install the capture logger (idempotent)
pub fn install() {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Warn);
    });
}

/// Number of records at `level` whose message contains `needle`
pub fn count(level: log::Level, needle: &str) -> usize {
    LOGGER
        .records
        .lock()
        .map(|records| {
            records
                .iter()
                .filter(|(l, msg)| *l == level && msg.contains(needle))
                .count()
        })
        .unwrap_or(0)
}
