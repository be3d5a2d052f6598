use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::trace::trace::TraceEvent;

/// Append-only JSONL record of a crawl session.
///
/// One line per [`TraceEvent`]: run start and finish, every screen as it is
/// discovered, repeated, ignored, found empty or finished, every widget
/// action (and whether its node had vanished), depth-limited children,
/// back presses and the budget that stopped the run. Each event is also
/// emitted at `trace` level so `-vvv` shows the same stream on stderr.
///
/// Best-effort: a file that cannot be opened or written disables or skips
/// the record with a warning, it never fails the crawl.
pub struct TraceLogger {
    file: Option<Mutex<File>>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not open trace file");
                Self::disabled()
            }
        }
    }

    /// A logger that keeps no file; events still reach `tracing`.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn log(&self, event: &TraceEvent) {
        tracing::trace!(
            event = ?event.event,
            step = event.step,
            screen = ?event.screen_id,
            widget = ?event.widget_label,
            detail = ?event.detail,
            "crawl event"
        );
        if let Some(file) = &self.file {
            Self::append(file, event);
        }
    }

    fn append(file: &Mutex<File>, event: &TraceEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };
        let mut file = match file.lock() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "trace file lock poisoned");
                return;
            }
        };
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::warn!(error = %e, "failed to write trace event");
        }
    }
}
