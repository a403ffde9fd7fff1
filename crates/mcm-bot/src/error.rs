//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key error: {0}")]
    Key(#[from] mcm_signer::KeyError),

    #[error("Feed error: {0}")]
    Feed(#[from] mcm_feed::FeedError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] mcm_ledger::LedgerError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] mcm_strategy::StrategyError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::dispatcher::DispatchError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mcm_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
