//! Ledger collaborator for the market contract maker.
//!
//! - `Ledger`: balance, decimals, allowance and contract-constant reads plus approvals
//! - `RpcLedger`: read-only JSON-RPC implementation
//! - `MockLedger`: in-memory implementation
//! - `Wallet`: integer/decimal amount conversion and approve-if-needed
//! - `ContractCache`: once-per-process market snapshot loader

pub mod contract_cache;
pub mod error;
pub mod ledger;
pub mod mock;
pub mod rpc;
pub mod wallet;

pub use contract_cache::ContractCache;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{BoxFuture, ConstantValue, ContractConstant, Ledger};
pub use mock::MockLedger;
pub use rpc::RpcLedger;
pub use wallet::Wallet;
