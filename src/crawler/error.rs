use thiserror::Error;

use crate::driver::error::DriverError;

/// Conditions that end a crawl early. Budget exhaustion is not among them.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The automation session was lost; the harness should end the run
    #[error("driver disconnected: {0}")]
    Disconnected(String),

    /// The target app could not be brought to the foreground
    #[error("failed to launch {package}: {source}")]
    Launch {
        package: String,
        #[source]
        source: DriverError,
    },

    /// A non-fatal driver error that a caller chose not to tolerate
    #[error(transparent)]
    Driver(DriverError),
}

impl CrawlError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CrawlError::Disconnected(_))
    }
}

impl From<DriverError> for CrawlError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::Disconnected(msg) => CrawlError::Disconnected(msg),
            other => CrawlError::Driver(other),
        }
    }
}
