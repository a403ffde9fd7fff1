//! Provider adapters.
//!
//! Supported envelopes:
//! - Coincap: `{"data": {"priceUsd" | "rateUsd": "...", "symbol": "..."}, "timestamp": ms}`
//! - Compound: `{"cToken": [{"supply_rate": {"value": "..."}}]}`, quoted in percent

use crate::error::{FeedError, FeedResult};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Percent scale applied to Compound supply rates.
const COMPOUND_RATE_SCALE: Decimal = Decimal::ONE_HUNDRED;
const COMPOUND_RATE_DP: u32 = 2;

/// Which adapter to apply to an oracle payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedProvider {
    /// Detect from the envelope shape.
    #[default]
    Auto,
    Coincap,
    Compound,
}

/// Provider-independent spot reading.
///
/// `price` stays textual; the pricer decides whether it is numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPrice {
    pub price: String,
    pub symbol: Option<String>,
    pub timestamp: Option<i64>,
}

impl NormalizedPrice {
    pub fn new(price: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            symbol: None,
            timestamp: None,
        }
    }
}

/// Reduce a raw oracle payload to a `NormalizedPrice`.
pub fn normalize(payload: &Value, provider: FeedProvider) -> FeedResult<NormalizedPrice> {
    match provider {
        FeedProvider::Coincap => coincap(payload),
        FeedProvider::Compound => compound(payload),
        FeedProvider::Auto => {
            if payload.get("cToken").is_some() {
                compound(payload)
            } else if payload.get("data").is_some() {
                coincap(payload)
            } else {
                Err(FeedError::Malformed(
                    "unrecognised oracle envelope".to_string(),
                ))
            }
        }
    }
}

fn coincap(payload: &Value) -> FeedResult<NormalizedPrice> {
    let data = payload
        .get("data")
        .ok_or_else(|| FeedError::Malformed("coincap payload has no data".to_string()))?;

    // Rate endpoints report rateUsd, asset endpoints priceUsd.
    let price = ["rateUsd", "priceUsd"]
        .iter()
        .find_map(|key| data.get(*key).and_then(scalar_text))
        .ok_or_else(|| FeedError::Malformed("coincap payload has no usd price".to_string()))?;

    Ok(NormalizedPrice {
        price,
        symbol: data.get("symbol").and_then(Value::as_str).map(str::to_owned),
        timestamp: payload.get("timestamp").and_then(Value::as_i64),
    })
}

fn compound(payload: &Value) -> FeedResult<NormalizedPrice> {
    let raw = payload
        .get("cToken")
        .and_then(Value::as_array)
        .and_then(|tokens| tokens.first())
        .and_then(|token| token.get("supply_rate"))
        .and_then(|rate| rate.get("value"))
        .and_then(scalar_text)
        .ok_or_else(|| {
            FeedError::Malformed("compound payload has no cToken supply rate".to_string())
        })?;

    let rate = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|e| FeedError::Malformed(format!("compound supply rate {raw}: {e}")))?;
    let percent = rate
        .checked_mul(COMPOUND_RATE_SCALE)
        .ok_or_else(|| FeedError::Malformed(format!("compound supply rate {raw} overflows")))?
        .round_dp_with_strategy(COMPOUND_RATE_DP, RoundingStrategy::MidpointAwayFromZero);

    Ok(NormalizedPrice::new(percent.to_string()))
}

/// Strings pass through; numbers are rendered as text. Anything else is absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coincap_asset_price() {
        let payload = json!({
            "data": {"id": "bitcoin", "symbol": "BTC", "priceUsd": "6421.5012"},
            "timestamp": 1_535_000_000_000i64
        });
        let price = normalize(&payload, FeedProvider::Coincap).unwrap();
        assert_eq!(price.price, "6421.5012");
        assert_eq!(price.symbol.as_deref(), Some("BTC"));
        assert_eq!(price.timestamp, Some(1_535_000_000_000));
    }

    #[test]
    fn test_coincap_prefers_rate() {
        let payload = json!({
            "data": {"symbol": "EUR", "rateUsd": "1.16", "priceUsd": "9.99"},
            "timestamp": 1
        });
        assert_eq!(normalize(&payload, FeedProvider::Auto).unwrap().price, "1.16");
    }

    #[test]
    fn test_coincap_missing_price_is_malformed() {
        let payload = json!({"data": {"symbol": "BTC", "priceUsd": null}});
        assert!(matches!(
            normalize(&payload, FeedProvider::Coincap),
            Err(FeedError::Malformed(_))
        ));
    }

    #[test]
    fn test_compound_rate_in_percent() {
        let payload = json!({
            "cToken": [{"symbol": "cDAI", "supply_rate": {"value": "0.0412345"}}]
        });
        let price = normalize(&payload, FeedProvider::Auto).unwrap();
        assert_eq!(price.price, "4.12");
        assert_eq!(price.symbol, None);
    }

    #[test]
    fn test_compound_numeric_rate_rounds_half_up() {
        let payload = json!({"cToken": [{"supply_rate": {"value": 0.04125}}]});
        assert_eq!(
            normalize(&payload, FeedProvider::Compound).unwrap().price,
            "4.13"
        );
    }

    #[test]
    fn test_compound_empty_token_list() {
        let payload = json!({"cToken": []});
        assert!(normalize(&payload, FeedProvider::Compound).is_err());
    }

    #[test]
    fn test_auto_rejects_unknown_envelope() {
        let payload = json!({"price": 1});
        assert!(matches!(
            normalize(&payload, FeedProvider::Auto),
            Err(FeedError::Malformed(_))
        ));
    }

    #[test]
    fn test_provider_from_config_text() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: FeedProvider,
        }
        let w: Wrapper = serde_json::from_str(r#"{"provider": "compound"}"#).unwrap();
        assert_eq!(w.provider, FeedProvider::Compound);
    }
}
