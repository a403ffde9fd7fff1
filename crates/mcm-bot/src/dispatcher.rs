//! JSON-RPC method dispatch.
//!
//! Routes `getOrder`, `getQuote` and `getMaxQuote` to the one strategy whose
//! market trades the requested tokens. Every failure is answered with an
//! error response for that request only.

use mcm_core::{
    format_address, Address, Intent, OrderParams, OrderTerms, RpcMethod, RpcRequest, RpcResponse,
    RpcResult,
};
use mcm_signer::{OrderSigner, SignerError};
use mcm_strategy::{BalanceCheck, BalanceRejection, Strategy, StrategyError};
use mcm_telemetry::Metrics;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("No market trades {maker_token} for {taker_token}")]
    NoMarket {
        maker_token: String,
        taker_token: String,
    },

    #[error("Tokens match more than one market: {0}")]
    AmbiguousMarket(String),

    #[error("makerAddress {requested} does not belong to this maker")]
    MakerMismatch { requested: String },

    #[error("{0}")]
    InsufficientBalance(BalanceRejection),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

pub struct Dispatcher {
    strategies: Vec<Arc<Strategy>>,
    signer: Arc<OrderSigner>,
}

impl Dispatcher {
    pub fn new(strategies: Vec<Arc<Strategy>>, signer: Arc<OrderSigner>) -> Self {
        Self { strategies, signer }
    }

    pub fn strategies(&self) -> &[Arc<Strategy>] {
        &self.strategies
    }

    pub fn maker_address(&self) -> Address {
        self.signer.maker_address()
    }

    /// Answer one request. Never fails; errors become error responses.
    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let started = Instant::now();
        let label = request
            .method
            .parse::<RpcMethod>()
            .map(|m| m.as_str())
            .unwrap_or("unknown");

        let response = match self.dispatch(&request).await {
            Ok(result) => {
                Metrics::request(label, "ok");
                RpcResponse::result(request.id, result)
            }
            Err(e) => {
                warn!(method = %request.method, id = %request.id, error = %e, "Request failed");
                Metrics::request(label, "error");
                RpcResponse::error(request.id, e.to_string())
            }
        };
        Metrics::request_latency(label, started.elapsed().as_secs_f64() * 1000.0);
        response
    }

    async fn dispatch(&self, request: &RpcRequest) -> DispatchResult<RpcResult> {
        let method: RpcMethod = request
            .method
            .parse()
            .map_err(|_| DispatchError::UnknownMethod(request.method.clone()))?;
        let params = parse_params(&request.params)?;
        debug!(%method, id = %request.id, ?params, "Request received");

        if let Some(requested) = params.maker_address {
            if requested != self.maker_address() {
                return Err(DispatchError::MakerMismatch {
                    requested: format_address(&requested),
                });
            }
        }

        let strategy = self.select(&params).await?;
        match method {
            RpcMethod::GetQuote => Ok(RpcResult::Quote(strategy.get_quote(&params).await?)),
            RpcMethod::GetMaxQuote => Ok(RpcResult::Quote(strategy.get_max_quote(&params).await?)),
            RpcMethod::GetOrder => self.get_order(strategy, &params).await,
        }
    }

    async fn get_order(
        &self,
        strategy: &Strategy,
        params: &OrderParams,
    ) -> DispatchResult<RpcResult> {
        let amounts = match strategy.validate_balances(params).await? {
            BalanceCheck::Approved(amounts) => amounts,
            BalanceCheck::Rejected(rejection) => {
                return Err(DispatchError::InsufficientBalance(rejection))
            }
        };
        let taker_address = params
            .taker_address
            .ok_or(StrategyError::MissingTakerAddress)?;

        let order = self.signer.new_order(OrderTerms {
            maker_address: self.maker_address(),
            maker_amount: amounts.maker_units,
            maker_token: params.maker_token,
            taker_address,
            taker_amount: amounts.taker_units,
            taker_token: params.taker_token,
        });
        let signed = self.signer.sign(order)?;
        Metrics::order_signed();

        info!(
            market = %format_address(&strategy.address()),
            maker_token = %format_address(&params.maker_token),
            maker_amount = %amounts.maker_units,
            taker_token = %format_address(&params.taker_token),
            taker_amount = %amounts.taker_units,
            nonce = %signed.order.nonce,
            expiration = signed.order.expiration,
            "Order signed"
        );
        Ok(RpcResult::Order(signed))
    }

    /// The single strategy trading either requested token.
    async fn select(&self, params: &OrderParams) -> DispatchResult<&Strategy> {
        let mut matched = Vec::new();
        for strategy in &self.strategies {
            if strategy.matches(params).await? {
                matched.push(strategy.as_ref());
            }
        }

        match matched.as_slice() {
            [] => Err(DispatchError::NoMarket {
                maker_token: format_address(&params.maker_token),
                taker_token: format_address(&params.taker_token),
            }),
            [strategy] => Ok(*strategy),
            many => Err(DispatchError::AmbiguousMarket(
                many.iter()
                    .map(|s| format_address(&s.address()))
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }

    /// Intents of every market.
    pub async fn intents(&self) -> DispatchResult<Vec<Intent>> {
        let mut intents = Vec::new();
        for strategy in &self.strategies {
            intents.extend(strategy.intents().await?);
        }
        Ok(intents)
    }
}

/// Params arrive as an object or a one-element array holding it.
fn parse_params(params: &Value) -> DispatchResult<OrderParams> {
    let object = match params {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    serde_json::from_value(object.clone()).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params_object_and_array() {
        let object = json!({
            "makerToken": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
            "takerToken": "0xdddddddddddddddddddddddddddddddddddddddd",
            "takerAmount": "100"
        });
        let from_object = parse_params(&object).unwrap();
        let from_array = parse_params(&json!([object])).unwrap();

        assert_eq!(from_object, from_array);
        assert_eq!(from_object.maker_token, Address::repeat_byte(0x0a));
        assert!(from_object.maker_amount.is_none());
    }

    #[test]
    fn test_parse_params_rejects_missing_tokens() {
        let err = parse_params(&json!({"takerAmount": "1"})).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParams(_)));
        assert!(matches!(
            parse_params(&Value::Null),
            Err(DispatchError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_balance_rejection_message() {
        let err = DispatchError::InsufficientBalance(BalanceRejection::InsufficientMaker {
            required: mcm_core::U256::from(148u64),
            available: mcm_core::U256::from(50u64),
        });
        assert_eq!(err.to_string(), "Insufficient maker balance: 50 < 148");
    }
}
