//! Strategy error types.

use crate::sanity::SanityError;
use mcm_core::CoreError;
use mcm_feed::FeedError;
use mcm_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Sanity(#[from] SanityError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] FeedError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Either makerAmount or takerAmount is required")]
    MissingAmount,

    #[error("takerAddress is required")]
    MissingTakerAddress,

    #[error("Token {0} is not traded by this market")]
    UnknownToken(String),

    #[error("Unsupported pair {maker} -> {taker}: one side must be collateral")]
    UnsupportedPair { maker: String, taker: String },
}

pub type StrategyResult<T> = Result<T, StrategyError>;
