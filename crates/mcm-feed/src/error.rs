//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Oracle fetch failed: {0}")]
    Fetch(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed oracle payload: {0}")]
    Malformed(String),

    #[error("No static price configured for {0}")]
    UnknownUrl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
