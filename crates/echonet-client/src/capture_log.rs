//! Process-wide `log` sink for asserting on emitted records in unit tests.

use std::sync::{Mutex, Once};

static CAPTURED: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

pub(crate) fn install() {
    INSTALL.call_once(|| {
        log::set_logger(&CaptureLogger).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// True when a warning containing every fragment has been logged.
pub(crate) fn warned(fragments: &[&str]) -> bool {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .any(|(level, msg)| *level == log::Level::Warn && fragments.iter().all(|f| msg.contains(f)))
}
