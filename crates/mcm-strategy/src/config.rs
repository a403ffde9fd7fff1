//! Strategy configuration.

use mcm_core::{Address, Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Skew parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Minimum full spread around fair value; half of it is the minimum skew.
    #[serde(default = "default_min_spread")]
    pub min_spread: Decimal,

    /// Skew as a fraction of the band midpoint `(ceiling + floor) / 2`.
    #[serde(default)]
    pub spread_width: Decimal,
}

impl PricingConfig {
    pub fn min_skew(&self) -> Decimal {
        self.min_spread / Decimal::TWO
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_spread: default_min_spread(),
            spread_width: Decimal::ZERO,
        }
    }
}

/// One row of the liquidity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityStep {
    /// Applies when the band spread is strictly below this value.
    pub below: Decimal,
    /// Maximum position-token quantity per quote.
    pub limit: Decimal,
}

/// Position-token size limit as a step function of the band spread.
///
/// Steps are checked in order; the first with `band_spread < below` wins.
/// A spread equal to a threshold falls through to the next, lower limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityTable {
    #[serde(default = "default_liquidity_steps")]
    pub steps: Vec<LiquidityStep>,

    #[serde(default = "default_liquidity_fallback")]
    pub fallback: Decimal,
}

impl LiquidityTable {
    pub fn limit_for(&self, band_spread: Decimal) -> Quantity {
        let limit = self
            .steps
            .iter()
            .find(|step| band_spread < step.below)
            .map(|step| step.limit)
            .unwrap_or(self.fallback);
        Quantity::new(limit)
    }
}

impl Default for LiquidityTable {
    fn default() -> Self {
        Self {
            steps: default_liquidity_steps(),
            fallback: default_liquidity_fallback(),
        }
    }
}

/// Process-wide strategy settings, built once at startup and shared by `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Address orders are made from; balances are checked against it.
    pub wallet_address: Address,
    /// Exchange contract granted spend approval.
    pub exchange_address: Address,
    pub collateral_address: Address,
    /// Fixed price of one collateral token.
    pub collateral_price: Price,
    pub pricing: PricingConfig,
    pub liquidity: LiquidityTable,
}

impl Configuration {
    pub fn new(
        wallet_address: Address,
        exchange_address: Address,
        collateral_address: Address,
    ) -> Self {
        Self {
            wallet_address,
            exchange_address,
            collateral_address,
            collateral_price: Price::ONE,
            pricing: PricingConfig::default(),
            liquidity: LiquidityTable::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_liquidity(mut self, liquidity: LiquidityTable) -> Self {
        self.liquidity = liquidity;
        self
    }

    pub fn with_collateral_price(mut self, price: Price) -> Self {
        self.collateral_price = price;
        self
    }

    pub fn is_collateral(&self, token: &Address) -> bool {
        self.collateral_address == *token
    }
}

fn default_min_spread() -> Decimal {
    Decimal::new(75, 2) // 0.75
}
fn default_liquidity_steps() -> Vec<LiquidityStep> {
    vec![LiquidityStep {
        below: Decimal::new(150, 0),
        limit: Decimal::new(25, 1), // 2.5 tokens
    }]
}
fn default_liquidity_fallback() -> Decimal {
    Decimal::new(1, 1) // 0.1 tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.min_spread, dec!(0.75));
        assert_eq!(pricing.spread_width, dec!(0));
        assert_eq!(pricing.min_skew(), dec!(0.375));

        let table = LiquidityTable::default();
        assert_eq!(table.steps.len(), 1);
        assert_eq!(table.fallback, dec!(0.1));
    }

    #[test]
    fn test_limit_boundary_is_conservative() {
        let table = LiquidityTable::default();
        assert_eq!(table.limit_for(dec!(0.8)).inner(), dec!(2.5));
        assert_eq!(table.limit_for(dec!(149.99)).inner(), dec!(2.5));
        assert_eq!(table.limit_for(dec!(150)).inner(), dec!(0.1));
        assert_eq!(table.limit_for(dec!(5000)).inner(), dec!(0.1));
    }

    #[test]
    fn test_multi_step_table_from_toml() {
        let toml_str = r#"
            fallback = 0.01

            [[steps]]
            below = 100
            limit = 1

            [[steps]]
            below = 1000
            limit = 0.1
        "#;
        let table: LiquidityTable = toml::from_str(toml_str).unwrap();
        assert_eq!(table.limit_for(dec!(99)).inner(), dec!(1));
        assert_eq!(table.limit_for(dec!(100)).inner(), dec!(0.1));
        assert_eq!(table.limit_for(dec!(1000)).inner(), dec!(0.01));
    }

    #[test]
    fn test_partial_pricing_toml_uses_defaults() {
        let pricing: PricingConfig = toml::from_str("spread_width = 0.01").unwrap();
        assert_eq!(pricing.min_spread, dec!(0.75));
        assert_eq!(pricing.spread_width, dec!(0.01));
    }

    #[test]
    fn test_configuration_builders() {
        let config = Configuration::new(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0xee),
            Address::repeat_byte(0xdd),
        )
        .with_collateral_price(Price::new(dec!(1.01)));

        assert!(config.is_collateral(&Address::repeat_byte(0xdd)));
        assert!(!config.is_collateral(&Address::repeat_byte(0x0a)));
        assert_eq!(config.collateral_price.inner(), dec!(1.01));
    }
}
