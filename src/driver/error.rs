use thiserror::Error;

/// Failures reported by an [`ActionDriver`](super::action_driver::ActionDriver).
///
/// Only [`DriverError::Disconnected`] is fatal to a crawl. Every other
/// variant is treated by the crawler as node staleness: the element is
/// skipped, the widget is marked finished, and exploration moves on.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The node vanished between enumeration and query/interaction
    #[error("UI node not found")]
    NotFound,

    /// The automation session is gone (bridge exited, pipe closed, ...)
    #[error("driver disconnected: {0}")]
    Disconnected(String),

    /// The driver answered a command with an error
    #[error("driver command '{command}' failed: {error}")]
    Protocol { command: String, error: String },

    /// Local I/O failure that did not take the session down
    #[error("driver I/O error: {0}")]
    Io(String),

    /// Malformed request/response payload
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    /// True when the error ends the crawl instead of degrading locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Disconnected(_))
    }
}

/// Split a driver result into "value", "tolerated failure" and "fatal".
///
/// Non-fatal errors become `Ok(None)` so callers can treat a vanished node
/// as absent; a disconnect is passed through.
pub fn tolerate<T>(result: Result<T, DriverError>) -> Result<Option<T>, DriverError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "tolerating driver error");
            Ok(None)
        }
    }
}
