//! Main application orchestration.
//!
//! Startup order:
//! - key, ledger and oracle feed from configuration
//! - one strategy per market contract
//! - load every market snapshot (fatal on failure)
//! - enable collateral and position tokens for the exchange (logged, not fatal)
//! - log intents, then serve JSON-RPC until Ctrl-C

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::error::AppResult;
use crate::server::{run_server, shutdown_signal};
use mcm_core::format_address;
use mcm_feed::{HttpOracleFeed, OracleFeed};
use mcm_ledger::{ContractCache, Ledger, RpcLedger, Wallet};
use mcm_signer::{KeyManager, OrderSigner};
use mcm_strategy::{Configuration, Strategy};
use mcm_telemetry::Metrics;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    strategy_config: Arc<Configuration>,
    wallet: Arc<Wallet>,
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// Build against the configured node and oracle feed.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let keys = KeyManager::load(&config.key.source(), config.expected_signer()?)?;
        let ledger: Arc<dyn Ledger> = Arc::new(RpcLedger::with_timeout(
            config.chain.rpc_url.clone(),
            config.ledger_timeout(),
        )?);
        let feed: Arc<dyn OracleFeed> = Arc::new(HttpOracleFeed::with_timeout(
            config.oracle.provider,
            config.oracle_timeout(),
        )?);
        Self::with_components(config, OrderSigner::with_defaults(keys), ledger, feed)
    }

    /// Build from already constructed collaborators.
    pub fn with_components(
        config: AppConfig,
        signer: OrderSigner,
        ledger: Arc<dyn Ledger>,
        feed: Arc<dyn OracleFeed>,
    ) -> AppResult<Self> {
        config.validate()?;
        let maker = signer.maker_address();
        let strategy_config = Arc::new(config.strategy_config(maker)?);
        let wallet = Arc::new(Wallet::new(maker, ledger.clone()));

        let strategies = config
            .chain
            .market_contracts
            .iter()
            .map(|contract| -> AppResult<Arc<Strategy>> {
                Ok(Arc::new(Strategy::new(
                    ContractCache::new(contract, ledger.clone())?,
                    strategy_config.clone(),
                    wallet.clone(),
                    feed.clone(),
                )))
            })
            .collect::<AppResult<Vec<_>>>()?;

        info!(
            maker = %format_address(&maker),
            markets = strategies.len(),
            exchange = %format_address(&strategy_config.exchange_address),
            collateral = %format_address(&strategy_config.collateral_address),
            "Application configured"
        );

        Ok(Self {
            config,
            strategy_config,
            wallet,
            dispatcher: Arc::new(Dispatcher::new(strategies, Arc::new(signer))),
        })
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Load snapshots, enable tokens and log intents.
    pub async fn prepare(&self) -> AppResult<()> {
        for strategy in self.dispatcher.strategies() {
            strategy.load().await?;
        }
        self.enable_tokens().await;

        let intents = self.dispatcher.intents().await?;
        for intent in &intents {
            info!(
                maker_token = %format_address(&intent.maker_token),
                taker_token = %format_address(&intent.taker_token),
                "Intent"
            );
        }
        info!(count = intents.len(), "Intents ready");
        Ok(())
    }

    /// Approvals may already be granted externally, so failures only warn.
    async fn enable_tokens(&self) {
        let collateral = self.strategy_config.collateral_address;
        let exchange = self.strategy_config.exchange_address;
        match self.wallet.enable_token(collateral, exchange).await {
            Ok(approved) => {
                Metrics::token_approval(if approved { "approved" } else { "already_enabled" })
            }
            Err(e) => {
                warn!(token = %format_address(&collateral), error = %e, "Failed to enable collateral");
                Metrics::token_approval("failed");
            }
        }

        for strategy in self.dispatcher.strategies() {
            if let Err(e) = strategy.enable_tokens().await {
                warn!(
                    market = %format_address(&strategy.address()),
                    error = %e,
                    "Failed to enable position tokens"
                );
                Metrics::token_approval("failed");
            }
        }
    }

    /// Prepare, then serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        self.prepare().await?;
        let listener = TcpListener::bind(self.config.server.listen_addr.as_str()).await?;
        run_server(listener, self.dispatcher.clone(), shutdown_signal()).await?;
        info!("Server stopped");
        Ok(())
    }
}
