//! Per-market strategy.
//!
//! One `Strategy` per market contract. It prices requests, clips them to
//! the liquidity table, checks both parties can settle, and advertises the
//! collateral/position pairs it makes.

use crate::config::Configuration;
use crate::context::MarketContext;
use crate::error::{StrategyError, StrategyResult};
use crate::pricer::Pricer;
use mcm_core::{
    format_address, Address, ContractSnapshot, Intent, OrderParams, Price, Quantity, Quote,
    QuoteSide, U256,
};
use mcm_feed::OracleFeed;
use mcm_ledger::{ContractCache, Wallet};
use mcm_telemetry::Metrics;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Both legs of a trade in whole tokens and on-chain units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amounts {
    pub maker_amount: Quantity,
    pub maker_units: U256,
    pub maker_price: Price,
    pub taker_amount: Quantity,
    pub taker_units: U256,
    pub taker_price: Price,
}

/// Why an order request was refused before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceRejection {
    MissingAmount,
    ZeroAmount,
    InsufficientMaker { required: U256, available: U256 },
    InsufficientTaker { required: U256, available: U256 },
}

impl BalanceRejection {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingAmount => "missing_amount",
            Self::ZeroAmount => "zero_amount",
            Self::InsufficientMaker { .. } => "insufficient_maker",
            Self::InsufficientTaker { .. } => "insufficient_taker",
        }
    }
}

impl fmt::Display for BalanceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAmount => write!(f, "Either makerAmount or takerAmount is required"),
            Self::ZeroAmount => write!(f, "Order amount is zero"),
            Self::InsufficientMaker {
                required,
                available,
            } => write!(f, "Insufficient maker balance: {available} < {required}"),
            Self::InsufficientTaker {
                required,
                available,
            } => write!(f, "Insufficient taker balance: {available} < {required}"),
        }
    }
}

/// Outcome of balance validation. Never partially filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    Approved(Amounts),
    Rejected(BalanceRejection),
}

pub struct Strategy {
    contract: ContractCache,
    config: Arc<Configuration>,
    wallet: Arc<Wallet>,
    pricer: Pricer,
}

impl Strategy {
    pub fn new(
        contract: ContractCache,
        config: Arc<Configuration>,
        wallet: Arc<Wallet>,
        feed: Arc<dyn OracleFeed>,
    ) -> Self {
        Self {
            contract,
            config,
            wallet,
            pricer: Pricer::new(feed),
        }
    }

    /// Market contract address.
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn config(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub fn contract(&self) -> &ContractCache {
        &self.contract
    }

    pub async fn load(&self) -> StrategyResult<Arc<ContractSnapshot>> {
        if let Some(snapshot) = self.contract.get() {
            return Ok(snapshot);
        }
        let loaded = self.contract.load().await;
        Metrics::snapshot_loaded(&format_address(&self.address()), loaded.is_ok());
        Ok(loaded?)
    }

    pub async fn context(&self) -> StrategyResult<MarketContext> {
        MarketContext::new(self.load().await?, self.config.clone())
    }

    /// Price both legs and derive the missing amount from the supplied one.
    ///
    /// `other = known * known_price / other_price`. When both amounts are
    /// given the maker amount wins.
    pub async fn get_amounts(
        &self,
        maker_amount: Option<U256>,
        maker_token: Address,
        taker_amount: Option<U256>,
        taker_token: Address,
    ) -> StrategyResult<Amounts> {
        let ctx = self.context().await?;
        ctx.pair_roles(&maker_token, &taker_token)?;
        let (maker_price, taker_price) = self.prices(&ctx, &maker_token, &taker_token).await?;

        let (maker, taker) = match (maker_amount, taker_amount) {
            (Some(units), _) => {
                let maker = self.wallet.decimalize(maker_token, units).await?;
                (maker, maker.convert(maker_price, taker_price)?)
            }
            (None, Some(units)) => {
                let taker = self.wallet.decimalize(taker_token, units).await?;
                (taker.convert(taker_price, maker_price)?, taker)
            }
            (None, None) => return Err(StrategyError::MissingAmount),
        };

        self.amounts(maker_token, maker, maker_price, taker_token, taker, taker_price)
            .await
    }

    /// Quote for the requested size, clipped to the liquidity limit.
    pub async fn get_quote(&self, params: &OrderParams) -> StrategyResult<Quote> {
        let amounts = self
            .get_amounts(
                params.maker_amount,
                params.maker_token,
                params.taker_amount,
                params.taker_token,
            )
            .await?;
        let ctx = self.context().await?;
        let limit = self.liquidity_limit(&ctx);

        let mut maker = amounts.maker_amount;
        let mut taker = amounts.taker_amount;
        if self.config.is_collateral(&params.maker_token) {
            if taker > limit {
                debug!(market = %ctx.market(), requested = %taker, %limit, "Clipping purchase");
                taker = limit;
                maker = taker.convert(amounts.taker_price, amounts.maker_price)?;
            }
        } else if maker > limit {
            debug!(market = %ctx.market(), requested = %maker, %limit, "Clipping sale");
            maker = limit;
            taker = maker.convert(amounts.maker_price, amounts.taker_price)?;
        }

        let clipped = self
            .amounts(
                params.maker_token,
                maker,
                amounts.maker_price,
                params.taker_token,
                taker,
                amounts.taker_price,
            )
            .await?;
        Ok(self.quote(params, clipped))
    }

    /// Quote for exactly the liquidity limit on the position-token side.
    pub async fn get_max_quote(&self, params: &OrderParams) -> StrategyResult<Quote> {
        let ctx = self.context().await?;
        ctx.pair_roles(&params.maker_token, &params.taker_token)?;
        let (maker_price, taker_price) = self
            .prices(&ctx, &params.maker_token, &params.taker_token)
            .await?;
        let limit = self.liquidity_limit(&ctx);

        let (maker, taker) = if self.config.is_collateral(&params.maker_token) {
            (limit.convert(taker_price, maker_price)?, limit)
        } else {
            (limit, limit.convert(maker_price, taker_price)?)
        };

        let amounts = self
            .amounts(
                params.maker_token,
                maker,
                maker_price,
                params.taker_token,
                taker,
                taker_price,
            )
            .await?;
        Ok(self.quote(params, amounts))
    }

    /// Largest position-token quantity the bot buys in one order.
    pub async fn max_purchase(&self) -> StrategyResult<Quantity> {
        Ok(self.liquidity_limit(&self.context().await?))
    }

    /// Largest position-token quantity the bot sells in one order.
    pub async fn max_sale(&self) -> StrategyResult<Quantity> {
        self.max_purchase().await
    }

    /// Whether either token of the request is one of this market's position tokens.
    pub async fn matches(&self, params: &OrderParams) -> StrategyResult<bool> {
        let tokens = self.load().await?.token_addresses();
        Ok(tokens.contains(&params.maker_token) || tokens.contains(&params.taker_token))
    }

    /// Check the bot can deliver the maker leg and the counterparty the taker leg.
    pub async fn validate_balances(&self, params: &OrderParams) -> StrategyResult<BalanceCheck> {
        let check = self.check_balances(params).await?;
        if let BalanceCheck::Rejected(rejection) = &check {
            warn!(
                market = %format_address(&self.address()),
                reason = rejection.reason(),
                %rejection,
                "Order request refused"
            );
            Metrics::balance_rejected(rejection.reason());
        }
        Ok(check)
    }

    async fn check_balances(&self, params: &OrderParams) -> StrategyResult<BalanceCheck> {
        if params.maker_amount.is_none() && params.taker_amount.is_none() {
            return Ok(BalanceCheck::Rejected(BalanceRejection::MissingAmount));
        }
        let taker_address = params
            .taker_address
            .ok_or(StrategyError::MissingTakerAddress)?;

        let amounts = self
            .get_amounts(
                params.maker_amount,
                params.maker_token,
                params.taker_amount,
                params.taker_token,
            )
            .await?;

        if amounts.maker_amount.is_zero() {
            return Ok(BalanceCheck::Rejected(BalanceRejection::ZeroAmount));
        }

        let maker_balance = self
            .wallet
            .balance_of(self.config.wallet_address, params.maker_token)
            .await?;
        if maker_balance < amounts.maker_units {
            return Ok(BalanceCheck::Rejected(BalanceRejection::InsufficientMaker {
                required: amounts.maker_units,
                available: maker_balance,
            }));
        }

        let taker_balance = self
            .wallet
            .balance_of(taker_address, params.taker_token)
            .await?;
        if taker_balance < amounts.taker_units {
            return Ok(BalanceCheck::Rejected(BalanceRejection::InsufficientTaker {
                required: amounts.taker_units,
                available: taker_balance,
            }));
        }

        Ok(BalanceCheck::Approved(amounts))
    }

    /// Approve the exchange to move both position tokens.
    pub async fn enable_tokens(&self) -> StrategyResult<()> {
        let tokens = self.load().await?.token_addresses();
        let exchange = self.config.exchange_address;
        for token in [tokens.long, tokens.short] {
            let approved = self.wallet.enable_token(token, exchange).await?;
            Metrics::token_approval(if approved { "approved" } else { "already_enabled" });
        }
        info!(market = %format_address(&self.address()), "Position tokens enabled");
        Ok(())
    }

    /// The four maker-role pairs this market trades.
    pub async fn intents(&self) -> StrategyResult<Vec<Intent>> {
        let tokens = self.load().await?.token_addresses();
        let collateral = self.config.collateral_address;
        Ok(vec![
            Intent::maker(collateral, tokens.long),
            Intent::maker(tokens.long, collateral),
            Intent::maker(collateral, tokens.short),
            Intent::maker(tokens.short, collateral),
        ])
    }

    fn liquidity_limit(&self, ctx: &MarketContext) -> Quantity {
        self.config.liquidity.limit_for(ctx.band_spread())
    }

    async fn prices(
        &self,
        ctx: &MarketContext,
        maker_token: &Address,
        taker_token: &Address,
    ) -> StrategyResult<(Price, Price)> {
        let maker_price = self.pricer.get(ctx, maker_token, QuoteSide::Maker).await?;
        let taker_price = self.pricer.get(ctx, taker_token, QuoteSide::Taker).await?;
        Ok((maker_price, taker_price))
    }

    async fn amounts(
        &self,
        maker_token: Address,
        maker_amount: Quantity,
        maker_price: Price,
        taker_token: Address,
        taker_amount: Quantity,
        taker_price: Price,
    ) -> StrategyResult<Amounts> {
        Ok(Amounts {
            maker_units: self.wallet.integerize(maker_token, maker_amount).await?,
            maker_amount,
            maker_price,
            taker_units: self.wallet.integerize(taker_token, taker_amount).await?,
            taker_amount,
            taker_price,
        })
    }

    fn quote(&self, params: &OrderParams, amounts: Amounts) -> Quote {
        Quote {
            maker_address: self.config.wallet_address,
            maker_token: params.maker_token,
            maker_amount: amounts.maker_units,
            taker_token: params.taker_token,
            taker_amount: amounts.taker_units,
            maker_price: amounts.maker_price,
            taker_price: amounts.taker_price,
        }
    }
}
