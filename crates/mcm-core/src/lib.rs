//! Core domain types for the market contract maker.
//!
//! This crate provides the types shared by every other crate:
//! - `Price`, `Quantity`: precision-safe numeric types and on-chain unit conversion
//! - `ContractSnapshot`, `PriceBand`, `TokenRole`: immutable market parameters
//! - `Order`, `SignedOrder`, `Quote`: trade proposals
//! - `RpcRequest`, `RpcResponse`, `Intent`: the request/response envelope

pub mod address;
pub mod decimal;
pub mod error;
pub mod market;
pub mod order;
pub mod rpc;

pub use address::{format_address, parse_address};
pub use decimal::{decimalize, integerize, Price, Quantity};
pub use error::{CoreError, Result};
pub use market::{ContractSnapshot, PriceBand, TokenAddresses, TokenRole};
pub use order::{Order, OrderSignature, OrderTerms, QuoteSide, SignedOrder};
pub use rpc::{
    Intent, IntentRole, OrderParams, Quote, RpcBody, RpcMethod, RpcRequest, RpcResponse,
    RpcResult, JSONRPC_VERSION,
};

pub use alloy::primitives::{Address, U256};
