//! Read-only JSON-RPC ledger.
//!
//! Reads are `eth_call`s against the node at `rpc_url` with ABI encoding
//! generated by `sol!`. Transactions are never broadcast from here, so
//! `approve` is unsupported and allowances must be granted by the wallet
//! operator.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{BoxFuture, ConstantValue, ContractConstant, Ledger};
use alloy::sol;
use alloy::sol_types::SolCall;
use mcm_core::{format_address, Address, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for node requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

sol! {
    interface IMarketContract {
        function LONG_POSITION_TOKEN() external view returns (address);
        function SHORT_POSITION_TOKEN() external view returns (address);
        function PRICE_CAP() external view returns (uint256);
        function PRICE_FLOOR() external view returns (uint256);
        function PRICE_DECIMAL_PLACES() external view returns (uint256);
        function ORACLE_URL() external view returns (string);
        function ORACLE_STATISTIC() external view returns (string);
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

#[derive(Debug, Serialize)]
struct CallObject {
    to: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct JsonRpcCall<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (CallObject, &'a str),
}

#[derive(Debug, Deserialize)]
struct JsonRpcReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcFault>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcFault {
    code: i64,
    message: String,
}

/// Ledger reading chain state through a node's JSON-RPC endpoint.
pub struct RpcLedger {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(rpc_url: impl Into<String>) -> LedgerResult<Self> {
        Self::with_timeout(rpc_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Rpc(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> LedgerResult<Vec<u8>> {
        let request = JsonRpcCall {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "eth_call",
            params: (
                CallObject {
                    to: format_address(&to),
                    data: format!("0x{}", hex::encode(data)),
                },
                "latest",
            ),
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rpc(format!("HTTP {status}: {body}")));
        }

        let reply: JsonRpcReply = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("Failed to parse response: {e}")))?;

        if let Some(fault) = reply.error {
            warn!(to = %format_address(&to), code = fault.code, "eth_call failed");
            return Err(LedgerError::Rpc(format!("{} (code {})", fault.message, fault.code)));
        }

        let result = reply
            .result
            .ok_or_else(|| LedgerError::Rpc("eth_call returned neither result nor error".into()))?;
        let raw = result.strip_prefix("0x").unwrap_or(&result);
        hex::decode(raw).map_err(|e| LedgerError::Decode {
            what: "eth_call result".to_string(),
            reason: e.to_string(),
        })
    }

    async fn call<C: SolCall + Send>(&self, to: Address, call: C) -> LedgerResult<C::Return> {
        let bytes = self.eth_call(to, call.abi_encode()).await?;
        C::abi_decode_returns(&bytes, true).map_err(|e| LedgerError::Decode {
            what: C::SIGNATURE.to_string(),
            reason: e.to_string(),
        })
    }

    async fn constant(
        &self,
        contract: Address,
        constant: ContractConstant,
    ) -> LedgerResult<ConstantValue> {
        use IMarketContract::*;

        debug!(contract = %format_address(&contract), %constant, "Reading market constant");
        let value = match constant {
            ContractConstant::LongPositionToken => {
                ConstantValue::Address(self.call(contract, LONG_POSITION_TOKENCall {}).await?._0)
            }
            ContractConstant::ShortPositionToken => {
                ConstantValue::Address(self.call(contract, SHORT_POSITION_TOKENCall {}).await?._0)
            }
            ContractConstant::PriceCap => {
                ConstantValue::Uint(self.call(contract, PRICE_CAPCall {}).await?._0)
            }
            ContractConstant::PriceFloor => {
                ConstantValue::Uint(self.call(contract, PRICE_FLOORCall {}).await?._0)
            }
            ContractConstant::PriceDecimalPlaces => {
                ConstantValue::Uint(self.call(contract, PRICE_DECIMAL_PLACESCall {}).await?._0)
            }
            ContractConstant::OracleUrl => {
                ConstantValue::Text(self.call(contract, ORACLE_URLCall {}).await?._0)
            }
            ContractConstant::OracleStatistic => {
                ConstantValue::Text(self.call(contract, ORACLE_STATISTICCall {}).await?._0)
            }
        };
        Ok(value)
    }
}

impl Ledger for RpcLedger {
    fn balance_of(&self, account: Address, token: Address) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            let ret = self
                .call(token, IERC20::balanceOfCall { owner: account })
                .await?;
            Ok(ret._0)
        })
    }

    fn decimals(&self, token: Address) -> BoxFuture<'_, LedgerResult<u8>> {
        Box::pin(async move { Ok(self.call(token, IERC20::decimalsCall {}).await?._0) })
    }

    fn allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            let ret = self
                .call(token, IERC20::allowanceCall { owner, spender })
                .await?;
            Ok(ret._0)
        })
    }

    fn approve(
        &self,
        token: Address,
        spender: Address,
        _amount: U256,
    ) -> BoxFuture<'_, LedgerResult<()>> {
        Box::pin(async move {
            Err(LedgerError::Unsupported(format!(
                "approve {} for {}: this ledger does not broadcast transactions",
                format_address(&token),
                format_address(&spender)
            )))
        })
    }

    fn read_constant(
        &self,
        contract: Address,
        constant: ContractConstant,
    ) -> BoxFuture<'_, LedgerResult<ConstantValue>> {
        Box::pin(self.constant(contract, constant))
    }
}
