use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid request count {requested}: choose between 1 and {available}")]
    InvalidRequestCount { requested: usize, available: usize },

    #[error("Item {position} failed: {reason}")]
    ItemDownloadFailed { position: usize, reason: String },

    #[error("Destination error: {0}")]
    Destination(String),
}
