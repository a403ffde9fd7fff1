//! Read-only market state shared by one pricing call.

use crate::config::Configuration;
use crate::error::{StrategyError, StrategyResult};
use mcm_core::{format_address, Address, ContractSnapshot, PriceBand, TokenRole};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Snapshot plus configuration, built per request.
///
/// The band is derived once here from the cached snapshot.
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub snapshot: Arc<ContractSnapshot>,
    pub config: Arc<Configuration>,
    band: PriceBand,
}

impl MarketContext {
    pub fn new(snapshot: Arc<ContractSnapshot>, config: Arc<Configuration>) -> StrategyResult<Self> {
        let band = snapshot.band()?;
        Ok(Self {
            snapshot,
            config,
            band,
        })
    }

    pub fn band(&self) -> PriceBand {
        self.band
    }

    pub fn ceiling(&self) -> Decimal {
        self.band.ceiling
    }

    pub fn floor(&self) -> Decimal {
        self.band.floor
    }

    pub fn band_spread(&self) -> Decimal {
        self.band.spread()
    }

    pub fn market(&self) -> String {
        format_address(&self.snapshot.address)
    }

    /// Resolve a token against this market and the configured collateral.
    pub fn role_of(&self, token: &Address) -> StrategyResult<TokenRole> {
        self.snapshot
            .role_of(token, &self.config.collateral_address)
            .ok_or_else(|| StrategyError::UnknownToken(format_address(token)))
    }

    /// Roles of a maker/taker pair; exactly one side must be collateral.
    pub fn pair_roles(
        &self,
        maker_token: &Address,
        taker_token: &Address,
    ) -> StrategyResult<(TokenRole, TokenRole)> {
        let maker = self.role_of(maker_token)?;
        let taker = self.role_of(taker_token)?;
        if maker.is_position() == taker.is_position() {
            return Err(StrategyError::UnsupportedPair {
                maker: format_address(maker_token),
                taker: format_address(taker_token),
            });
        }
        Ok((maker, taker))
    }
}
