//! Order-related types.
//!
//! An `Order` is the trade commitment counterparties settle on-chain. Its
//! field order is significant: the signed hash covers the fields in exactly
//! the order they are declared here.

use crate::address::lower_hex;
use crate::decimal::u256_string;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a trade the bot is pricing a token for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSide {
    /// The bot gives this token away (sells it); priced above fair value.
    Maker,
    /// The bot receives this token (buys it back); priced below fair value.
    Taker,
}

impl fmt::Display for QuoteSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maker => write!(f, "maker"),
            Self::Taker => write!(f, "taker"),
        }
    }
}

/// Economic terms of an order before it is stamped with expiration and nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerms {
    pub maker_address: Address,
    pub maker_amount: U256,
    pub maker_token: Address,
    pub taker_address: Address,
    pub taker_amount: U256,
    pub taker_token: Address,
}

/// A trade commitment in on-chain units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(with = "lower_hex")]
    pub maker_address: Address,
    #[serde(with = "u256_string")]
    pub maker_amount: U256,
    #[serde(with = "lower_hex")]
    pub maker_token: Address,
    #[serde(with = "lower_hex")]
    pub taker_address: Address,
    #[serde(with = "u256_string")]
    pub taker_amount: U256,
    #[serde(with = "lower_hex")]
    pub taker_token: Address,
    /// Unix seconds.
    pub expiration: u64,
    #[serde(with = "u256_string")]
    pub nonce: U256,
}

impl Order {
    pub fn from_terms(terms: OrderTerms, expiration: u64, nonce: U256) -> Self {
        Self {
            maker_address: terms.maker_address,
            maker_amount: terms.maker_amount,
            maker_token: terms.maker_token,
            taker_address: terms.taker_address,
            taker_amount: terms.taker_amount,
            taker_token: terms.taker_token,
            expiration,
            nonce,
        }
    }
}

/// Recoverable ECDSA signature split into its canonical components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignature {
    /// Recovery id in legacy form (27 or 28).
    pub v: u8,
    /// `0x`-prefixed 32-byte hex.
    pub r: String,
    /// `0x`-prefixed 32-byte hex.
    pub s: String,
}

/// Order fields merged with the maker's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(flatten)]
    pub signature: OrderSignature,
}
