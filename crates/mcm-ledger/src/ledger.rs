//! The ledger seam.

use crate::error::{LedgerError, LedgerResult};
use mcm_core::{Address, U256};
use std::fmt;
use std::pin::Pin;

/// Boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Immutable constants exposed by a market contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractConstant {
    LongPositionToken,
    ShortPositionToken,
    PriceCap,
    PriceFloor,
    PriceDecimalPlaces,
    OracleUrl,
    OracleStatistic,
}

impl ContractConstant {
    pub const ALL: [ContractConstant; 7] = [
        Self::LongPositionToken,
        Self::ShortPositionToken,
        Self::PriceCap,
        Self::PriceFloor,
        Self::PriceDecimalPlaces,
        Self::OracleUrl,
        Self::OracleStatistic,
    ];

    /// Name of the contract getter.
    pub fn getter(&self) -> &'static str {
        match self {
            Self::LongPositionToken => "LONG_POSITION_TOKEN",
            Self::ShortPositionToken => "SHORT_POSITION_TOKEN",
            Self::PriceCap => "PRICE_CAP",
            Self::PriceFloor => "PRICE_FLOOR",
            Self::PriceDecimalPlaces => "PRICE_DECIMAL_PLACES",
            Self::OracleUrl => "ORACLE_URL",
            Self::OracleStatistic => "ORACLE_STATISTIC",
        }
    }
}

impl fmt::Display for ContractConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.getter())
    }
}

/// Raw value of a contract constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue {
    Address(Address),
    Uint(U256),
    Text(String),
}

impl ConstantValue {
    pub fn into_address(self, constant: ContractConstant) -> LedgerResult<Address> {
        match self {
            Self::Address(a) => Ok(a),
            _ => Err(type_error(constant, "address")),
        }
    }

    pub fn into_uint(self, constant: ContractConstant) -> LedgerResult<U256> {
        match self {
            Self::Uint(v) => Ok(v),
            _ => Err(type_error(constant, "uint256")),
        }
    }

    pub fn into_text(self, constant: ContractConstant) -> LedgerResult<String> {
        match self {
            Self::Text(s) => Ok(s),
            _ => Err(type_error(constant, "string")),
        }
    }
}

fn type_error(constant: ContractConstant, expected: &'static str) -> LedgerError {
    LedgerError::ConstantType {
        constant: constant.to_string(),
        expected,
    }
}

/// Chain access used by the wallet and the snapshot loader.
///
/// Implementations do not retry; a failed call is returned as is.
pub trait Ledger: Send + Sync {
    /// Integer balance of `account` in `token`.
    fn balance_of(&self, account: Address, token: Address) -> BoxFuture<'_, LedgerResult<U256>>;

    /// Declared decimal precision of `token`.
    fn decimals(&self, token: Address) -> BoxFuture<'_, LedgerResult<u8>>;

    /// Amount `spender` may move out of `owner`'s `token` balance.
    fn allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> BoxFuture<'_, LedgerResult<U256>>;

    /// Grant `spender` an allowance of `amount` over the wallet's `token`.
    fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> BoxFuture<'_, LedgerResult<()>>;

    /// Read one immutable market contract constant.
    fn read_constant(
        &self,
        contract: Address,
        constant: ContractConstant,
    ) -> BoxFuture<'_, LedgerResult<ConstantValue>>;
}
