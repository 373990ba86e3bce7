use std::time::Duration;

use thiserror::Error;

/// What went wrong while talking to one external source.
///
/// Adapter internals return these; the aggregator converts them into a
/// degraded record for that source's slot, so a fetch error never escapes
/// a polling cycle.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Classify a reqwest error into the fetch taxonomy.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::Unreachable(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
