//! JSON-RPC request/response envelope exchanged with the dispatcher.
//!
//! Inbound: `{id, method, params: {makerToken, makerAmount?, takerAddress,
//! takerToken, takerAmount?}}`. Outbound: `{id, jsonrpc: "2.0", result}` or
//! `{id, jsonrpc: "2.0", error}`.

use crate::address::lower_hex;
use crate::decimal::{u256_string, Price};
use crate::order::SignedOrder;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const JSONRPC_VERSION: &str = "2.0";

/// Methods a maker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "getOrder")]
    GetOrder,
    #[serde(rename = "getQuote")]
    GetQuote,
    #[serde(rename = "getMaxQuote")]
    GetMaxQuote,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 3] = [Self::GetOrder, Self::GetQuote, Self::GetMaxQuote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetOrder => "getOrder",
            Self::GetQuote => "getQuote",
            Self::GetMaxQuote => "getMaxQuote",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unsupported method: {s}"))
    }
}

/// Inbound request.
///
/// `method` and `params` stay loosely typed so a malformed request can still
/// be answered with an error carrying its `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Typed request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    #[serde(with = "lower_hex::option", default)]
    pub maker_address: Option<Address>,
    #[serde(with = "lower_hex")]
    pub maker_token: Address,
    #[serde(with = "u256_string::option", default)]
    pub maker_amount: Option<U256>,
    #[serde(with = "lower_hex::option", default)]
    pub taker_address: Option<Address>,
    #[serde(with = "lower_hex")]
    pub taker_token: Address,
    #[serde(with = "u256_string::option", default)]
    pub taker_amount: Option<U256>,
}

/// Price-consistent quote in on-chain units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(with = "lower_hex")]
    pub maker_address: Address,
    #[serde(with = "lower_hex")]
    pub maker_token: Address,
    #[serde(with = "u256_string")]
    pub maker_amount: U256,
    #[serde(with = "lower_hex")]
    pub taker_token: Address,
    #[serde(with = "u256_string")]
    pub taker_amount: U256,
    pub maker_price: Price,
    pub taker_price: Price,
}

/// Successful response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RpcResult {
    Quote(Quote),
    Order(SignedOrder),
}

/// Either `result` or `error`, flattened into the response object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcBody {
    Result(RpcResult),
    Error(String),
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcResponse {
    pub id: serde_json::Value,
    pub jsonrpc: &'static str,
    #[serde(flatten)]
    pub body: RpcBody,
}

impl RpcResponse {
    pub fn result(id: serde_json::Value, result: RpcResult) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            body: RpcBody::Result(result),
        }
    }

    pub fn error(id: serde_json::Value, message: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            body: RpcBody::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, RpcBody::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            RpcBody::Error(msg) => Some(msg),
            RpcBody::Result(_) => None,
        }
    }
}

/// Role advertised in an intent. Only makers are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentRole {
    Maker,
}

/// Trading-pair advertisement registered with the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub role: IntentRole,
    pub supported_methods: Vec<RpcMethod>,
    #[serde(with = "lower_hex")]
    pub maker_token: Address,
    #[serde(with = "lower_hex")]
    pub taker_token: Address,
}

impl Intent {
    pub fn maker(maker_token: Address, taker_token: Address) -> Self {
        Self {
            role: IntentRole::Maker,
            supported_methods: RpcMethod::ALL.to_vec(),
            maker_token,
            taker_token,
        }
    }
}
