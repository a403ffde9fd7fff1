//! Market contract maker.
//!
//! Serves `getOrder`, `getQuote` and `getMaxQuote` for the long and short
//! position tokens of one or more market contracts:
//! - Configuration from TOML plus environment overrides
//! - One strategy per market, selected by the requested tokens
//! - Orders signed locally by the maker key
//! - JSON-RPC over HTTP with health and metrics endpoints

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod server;

pub use app::Application;
pub use config::AppConfig;
pub use dispatcher::{DispatchError, DispatchResult, Dispatcher};
pub use error::{AppError, AppResult};
