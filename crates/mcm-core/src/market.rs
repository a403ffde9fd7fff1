//! Market contract parameters.
//!
//! A market contract issues a long and a short position token whose
//! combined value is bounded by the contract's price floor and cap. These
//! parameters are read from chain once and never change afterwards.

use crate::address::{format_address, lower_hex};
use crate::error::{CoreError, Result};
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a token plays relative to one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    /// The settlement token; always priced at the configured reference price.
    Collateral,
    /// Position token that gains as spot rises toward the cap.
    Long,
    /// Position token that gains as spot falls toward the floor.
    Short,
}

impl TokenRole {
    pub fn is_position(&self) -> bool {
        matches!(self, Self::Long | Self::Short)
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collateral => write!(f, "collateral"),
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Long/short position token pair of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAddresses {
    #[serde(with = "lower_hex")]
    pub long: Address,
    #[serde(with = "lower_hex")]
    pub short: Address,
}

impl TokenAddresses {
    pub fn contains(&self, token: &Address) -> bool {
        self.long == *token || self.short == *token
    }
}

/// Price range a position token can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub ceiling: Decimal,
    pub floor: Decimal,
}

impl PriceBand {
    /// Maximum theoretical value of either position token.
    pub fn spread(&self) -> Decimal {
        self.ceiling - self.floor
    }
}

/// Immutable market parameters read from the market contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    #[serde(with = "lower_hex")]
    pub address: Address,
    #[serde(with = "lower_hex")]
    pub long_token_address: Address,
    #[serde(with = "lower_hex")]
    pub short_token_address: Address,
    #[serde(with = "crate::decimal::u256_string")]
    pub price_cap: U256,
    #[serde(with = "crate::decimal::u256_string")]
    pub price_floor: U256,
    pub price_decimal_places: u8,
    pub oracle_url: String,
    pub oracle_statistic: String,
}

impl ContractSnapshot {
    /// Build a snapshot, rejecting parameters that cannot describe a market.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        long_token_address: Address,
        short_token_address: Address,
        price_cap: U256,
        price_floor: U256,
        price_decimal_places: u8,
        oracle_url: String,
        oracle_statistic: String,
    ) -> Result<Self> {
        if price_cap < price_floor {
            return Err(CoreError::InvalidSnapshot(format!(
                "{}: price cap {price_cap} is below price floor {price_floor}",
                format_address(&address)
            )));
        }
        if long_token_address == short_token_address {
            return Err(CoreError::InvalidSnapshot(format!(
                "{}: long and short position tokens are the same address",
                format_address(&address)
            )));
        }

        let snapshot = Self {
            address,
            long_token_address,
            short_token_address,
            price_cap,
            price_floor,
            price_decimal_places,
            oracle_url,
            oracle_statistic,
        };
        // Surface unrepresentable bounds at load time rather than per quote.
        snapshot.band()?;
        Ok(snapshot)
    }

    /// Ceiling and floor in whole price units.
    pub fn band(&self) -> Result<PriceBand> {
        Ok(PriceBand {
            ceiling: self.scaled(self.price_cap)?,
            floor: self.scaled(self.price_floor)?,
        })
    }

    pub fn ceiling(&self) -> Result<Decimal> {
        self.scaled(self.price_cap)
    }

    pub fn floor(&self) -> Result<Decimal> {
        self.scaled(self.price_floor)
    }

    pub fn band_spread(&self) -> Result<Decimal> {
        Ok(self.band()?.spread())
    }

    pub fn token_addresses(&self) -> TokenAddresses {
        TokenAddresses {
            long: self.long_token_address,
            short: self.short_token_address,
        }
    }

    /// Resolve which instrument `token` is in this market.
    ///
    /// Returns `None` for tokens that are neither position token nor the
    /// configured collateral.
    pub fn role_of(&self, token: &Address, collateral: &Address) -> Option<TokenRole> {
        if *token == self.long_token_address {
            Some(TokenRole::Long)
        } else if *token == self.short_token_address {
            Some(TokenRole::Short)
        } else if token == collateral {
            Some(TokenRole::Collateral)
        } else {
            None
        }
    }

    fn scaled(&self, raw: U256) -> Result<Decimal> {
        Ok(crate::decimal::decimalize(raw, self.price_decimal_places)?.inner())
    }
}
