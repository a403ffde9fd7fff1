//! Guards applied to every derived price.

use crate::context::MarketContext;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanityError {
    #[error("The value, {0}, is not greater than 0")]
    NotAboveZero(Decimal),

    #[error("The value, {0:?}, is not numeric")]
    NotNumeric(String),

    #[error("The quote ({value}) would exceed the maximum token value ({band_spread})")]
    ExceedsBand { value: Decimal, band_spread: Decimal },
}

impl SanityError {
    /// Metric label of the failed check.
    pub fn check(&self) -> &'static str {
        match self {
            Self::NotAboveZero(_) => "not_above_zero",
            Self::NotNumeric(_) => "not_numeric",
            Self::ExceedsBand { .. } => "exceeds_band",
        }
    }
}

/// Stateless price checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanityChecker;

impl SanityChecker {
    pub fn greater_than_zero(value: Decimal) -> Result<Decimal, SanityError> {
        if value > Decimal::ZERO {
            Ok(value)
        } else {
            Err(SanityError::NotAboveZero(value))
        }
    }

    /// Parse `raw` as a finite decimal, plain or scientific notation.
    pub fn is_numeric(raw: &str) -> Result<Decimal, SanityError> {
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| SanityError::NotNumeric(raw.to_string()))
    }

    /// A price may never exceed the full width of the market's band.
    pub fn less_than_band(value: Decimal, ctx: &MarketContext) -> Result<Decimal, SanityError> {
        let band_spread = ctx.band_spread();
        if value > band_spread {
            Err(SanityError::ExceedsBand { value, band_spread })
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use mcm_core::{Address, ContractSnapshot, U256};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn ctx() -> MarketContext {
        let snapshot = ContractSnapshot::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x0a),
            Address::repeat_byte(0x0b),
            U256::from(90u64),
            U256::from(10u64),
            2,
            "oracle://btc".to_string(),
            "rateUsd".to_string(),
        )
        .unwrap();
        let config = Configuration::new(Address::ZERO, Address::ZERO, Address::repeat_byte(0xdd));
        MarketContext::new(Arc::new(snapshot), Arc::new(config)).unwrap()
    }

    #[test]
    fn test_greater_than_zero() {
        assert_eq!(SanityChecker::greater_than_zero(dec!(0.01)), Ok(dec!(0.01)));
        assert_eq!(
            SanityChecker::greater_than_zero(dec!(0)),
            Err(SanityError::NotAboveZero(dec!(0)))
        );
        assert!(SanityChecker::greater_than_zero(dec!(-0.075)).is_err());
    }

    #[test]
    fn test_is_numeric() {
        assert_eq!(SanityChecker::is_numeric("6421.5012"), Ok(dec!(6421.5012)));
        assert_eq!(SanityChecker::is_numeric(" 0.40 "), Ok(dec!(0.40)));
        assert_eq!(SanityChecker::is_numeric("1e-2"), Ok(dec!(0.01)));
        assert!(matches!(
            SanityChecker::is_numeric("NaN"),
            Err(SanityError::NotNumeric(_))
        ));
        assert!(SanityChecker::is_numeric("").is_err());
        assert!(SanityChecker::is_numeric("Infinity").is_err());
    }

    #[test]
    fn test_less_than_band() {
        let ctx = ctx();
        assert_eq!(ctx.band_spread(), dec!(0.8));
        assert!(SanityChecker::less_than_band(dec!(0.8), &ctx).is_ok());
        assert_eq!(
            SanityChecker::less_than_band(dec!(0.81), &ctx),
            Err(SanityError::ExceedsBand {
                value: dec!(0.81),
                band_spread: dec!(0.8)
            })
        );
    }

    #[test]
    fn test_pair_roles() {
        let ctx = ctx();
        let collateral = Address::repeat_byte(0xdd);
        let long = Address::repeat_byte(0x0a);
        let short = Address::repeat_byte(0x0b);

        assert!(ctx.pair_roles(&long, &collateral).is_ok());
        assert!(ctx.pair_roles(&collateral, &short).is_ok());
        assert!(ctx.pair_roles(&long, &short).is_err());
        assert!(ctx.pair_roles(&collateral, &collateral).is_err());
        assert!(ctx.pair_roles(&Address::repeat_byte(0x77), &collateral).is_err());
    }
}
