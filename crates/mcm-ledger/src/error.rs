//! Ledger error types.

use mcm_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Unsupported ledger operation: {0}")]
    Unsupported(String),

    #[error("Unexpected value for {constant}: expected {expected}")]
    ConstantType {
        constant: String,
        expected: &'static str,
    },

    #[error("Market contract parameters changed on chain: {0}")]
    SnapshotDrift(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
