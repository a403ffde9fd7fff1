//! Precision-safe decimal types for pricing.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors when converting between human-readable
//! token quantities and integer on-chain units.

use crate::error::{CoreError, Result};
use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Largest number of decimal places `Decimal` can represent.
const MAX_SCALE: u8 = 28;

/// Price of one whole token, denominated in collateral.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with quantities in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Token quantity in whole (decimalized) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub Decimal);

impl Quantity {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Collateral value of this quantity: `quantity * price`.
    pub fn value_at(&self, price: Price) -> Result<Decimal> {
        self.0
            .checked_mul(price.0)
            .ok_or_else(|| CoreError::DecimalOverflow(format!("{} * {}", self.0, price.0)))
    }

    /// Quantity of a token priced at `price` worth `value` collateral.
    pub fn from_value(value: Decimal, price: Price) -> Result<Self> {
        if price.is_zero() {
            return Err(CoreError::InvalidAmount(format!(
                "cannot convert {value} at a zero price"
            )));
        }
        value
            .checked_div(price.0)
            .map(Self)
            .ok_or_else(|| CoreError::DecimalOverflow(format!("{value} / {}", price.0)))
    }

    /// Re-express this quantity in another token at the given price ratio:
    /// `self * own_price / other_price`.
    pub fn convert(&self, own_price: Price, other_price: Price) -> Result<Self> {
        Self::from_value(self.value_at(own_price)?, other_price)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Quantity {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// `10^decimals` as a `Decimal`.
fn pow10(decimals: u8) -> Result<Decimal> {
    if decimals > MAX_SCALE {
        return Err(CoreError::DecimalOverflow(format!(
            "{decimals} decimals exceeds the supported precision"
        )));
    }
    Decimal::try_from_i128_with_scale(10i128.pow(u32::from(decimals)), 0)
        .map_err(|e| CoreError::DecimalOverflow(e.to_string()))
}

/// Convert an integer on-chain amount into a whole-token quantity.
///
/// Exact: the integer becomes the mantissa and `decimals` the scale.
pub fn decimalize(amount: U256, decimals: u8) -> Result<Quantity> {
    if decimals > MAX_SCALE {
        return Err(CoreError::DecimalOverflow(format!(
            "{decimals} decimals exceeds the supported precision"
        )));
    }
    let mut value = Decimal::from_str_exact(&amount.to_string())
        .map_err(|_| CoreError::DecimalOverflow(format!("amount {amount} is too large")))?;
    value
        .set_scale(u32::from(decimals))
        .map_err(|e| CoreError::DecimalOverflow(e.to_string()))?;
    Ok(Quantity(value.normalize()))
}

/// Convert a whole-token quantity into integer on-chain units.
///
/// Fractions of the smallest unit are truncated, never rounded up, so
/// a converted amount can never exceed what the quantity is worth.
pub fn integerize(quantity: Quantity, decimals: u8) -> Result<U256> {
    if quantity.0.is_sign_negative() && !quantity.0.is_zero() {
        return Err(CoreError::InvalidAmount(format!(
            "negative quantity {quantity}"
        )));
    }
    let scaled = quantity
        .0
        .checked_mul(pow10(decimals)?)
        .ok_or_else(|| CoreError::DecimalOverflow(format!("{quantity} * 10^{decimals}")))?
        .trunc();
    U256::from_str(&scaled.abs().to_string())
        .map_err(|e| CoreError::InvalidAmount(format!("{scaled}: {e}")))
}

/// Serde helpers for `U256` amounts carried as canonical decimal strings.
pub mod u256_string {
    use alloy::primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    fn parse<E: de::Error>(raw: Raw) -> Result<U256, E> {
        match raw {
            Raw::Number(n) => Ok(U256::from(n)),
            Raw::Text(s) => U256::from_str(s.trim()).map_err(E::custom),
        }
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        parse(Raw::deserialize(deserializer)?)
    }

    /// Same encoding for optional amounts; `null` and missing map to `None`.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<U256>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(parse)
                .transpose()
        }
    }
}
