//! Pricing and order construction for market contract position tokens.
//!
//! # Architecture
//!
//! ```text
//! OrderParams → Strategy
//!                ├─ MarketContext: cached snapshot + configuration
//!                ├─ Pricer: oracle spot → fair value → skewed price
//!                │    └─ SanityChecker: > 0, < band spread
//!                ├─ LiquidityTable: clip to the per-order limit
//!                └─ Wallet: decimals, balances, approvals
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod pricer;
pub mod sanity;
pub mod strategy;

pub use config::{Configuration, LiquidityStep, LiquidityTable, PricingConfig};
pub use context::MarketContext;
pub use error::{StrategyError, StrategyResult};
pub use pricer::Pricer;
pub use sanity::{SanityChecker, SanityError};
pub use strategy::{Amounts, BalanceCheck, BalanceRejection, Strategy};
