use lucid_http::HttpError;
use std::time::Duration;
use thiserror::Error;

use crate::blocking::BlockReason;

/// Why one tier did not produce usable HTML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("blocked: {0}")]
    Blocked(BlockReason),
    #[error("content too short ({chars} chars, need more than {required})")]
    TooShort { chars: usize, required: usize },
    #[error("browser unavailable: {0}")]
    Unavailable(String),
    #[error("no archived snapshot")]
    NoSnapshot,
    #[error("tier disabled")]
    Disabled,
    #[error("cancelled")]
    Cancelled,
}

impl From<HttpError> for TierFailure {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout(d) => TierFailure::Timeout(d),
            other => TierFailure::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Every tier failed; `source` is the last live-site failure.
    #[error("could not acquire page (site: {source}; archive: {archive})")]
    Exhausted {
        source: TierFailure,
        archive: TierFailure,
    },
    #[error("acquisition cancelled")]
    Cancelled,
}
