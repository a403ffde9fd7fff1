//! Signer error types.

use alloy::primitives::Address;
use thiserror::Error;

/// Key loading errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type SignerResult<T> = Result<T, SignerError>;
