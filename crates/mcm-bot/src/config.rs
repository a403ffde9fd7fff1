//! Application configuration.
//!
//! Loaded from TOML, then overridden by the deployment environment
//! variables `MARKET_CONTRACTS`, `COLLATERAL_ADDRESS`, `EXCHANGE_ADDRESS`
//! and `RPC_URL`.

use crate::error::{AppError, AppResult};
use mcm_core::{parse_address, Address, Price};
use mcm_feed::FeedProvider;
use mcm_signer::KeySource;
use mcm_strategy::{Configuration, LiquidityTable, PricingConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Chain access and market selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC node used for balance, decimals and constant reads.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Node request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Market contracts to make. At least one is required.
    #[serde(default)]
    pub market_contracts: Vec<String>,

    #[serde(default = "default_exchange_address")]
    pub exchange_address: String,

    #[serde(default = "default_collateral_address")]
    pub collateral_address: String,

    /// Fixed reference price of one collateral token.
    #[serde(default = "default_collateral_price")]
    pub collateral_price: Decimal,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            timeout_ms: default_timeout_ms(),
            market_contracts: Vec::new(),
            exchange_address: default_exchange_address(),
            collateral_address: default_collateral_address(),
            collateral_price: default_collateral_price(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_exchange_address() -> String {
    "0x8fd3121013a07c57f0d69646e86e7a4880b467b7".to_string()
}

fn default_collateral_address() -> String {
    "0x89d24a6b4ccb1b6faa2625fe562bdd9a23260359".to_string()
}

fn default_collateral_price() -> Decimal {
    Decimal::ONE
}

/// Signing key location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Environment variable holding the hex key. Ignored when `file` is set.
    #[serde(default = "default_key_env_var")]
    pub env_var: String,

    /// File holding the hex key (recommend 0600 permissions).
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// If set, startup fails unless the key derives this address.
    #[serde(default)]
    pub expected_address: Option<String>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            env_var: default_key_env_var(),
            file: None,
            expected_address: None,
        }
    }
}

fn default_key_env_var() -> String {
    "PRIVATE_KEY".to_string()
}

impl KeyConfig {
    pub fn source(&self) -> KeySource {
        match &self.file {
            Some(path) => KeySource::File { path: path.clone() },
            None => KeySource::EnvVar {
                var_name: self.env_var.clone(),
            },
        }
    }
}

/// Oracle feed access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub provider: FeedProvider,

    /// Fetch timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: FeedProvider::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub key: KeyConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub liquidity: LiquidityTable,
}

impl AppConfig {
    /// Load from a specific file and apply environment overrides.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        let mut config = Self::from_toml(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply overrides from `lookup`, usually the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(contracts) = lookup("MARKET_CONTRACTS") {
            self.chain.market_contracts = contracts
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(collateral) = lookup("COLLATERAL_ADDRESS") {
            self.chain.collateral_address = collateral;
        }
        if let Some(exchange) = lookup("EXCHANGE_ADDRESS") {
            self.chain.exchange_address = exchange;
        }
        if let Some(rpc_url) = lookup("RPC_URL") {
            self.chain.rpc_url = rpc_url;
        }
    }

    /// Check everything startup needs before any network access.
    pub fn validate(&self) -> AppResult<()> {
        if self.chain.market_contracts.is_empty() {
            return Err(AppError::Config(
                "At least one market contract is required (MARKET_CONTRACTS)".to_string(),
            ));
        }
        for contract in &self.chain.market_contracts {
            parse_config_address("market contract", contract)?;
        }
        self.exchange_address()?;
        self.collateral_address()?;
        self.expected_signer()?;
        if self.chain.collateral_price <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "collateral_price must be above zero, got {}",
                self.chain.collateral_price
            )));
        }
        if self.liquidity.fallback < Decimal::ZERO
            || self.liquidity.steps.iter().any(|s| s.limit < Decimal::ZERO)
        {
            return Err(AppError::Config(
                "Liquidity limits must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn exchange_address(&self) -> AppResult<Address> {
        parse_config_address("exchange", &self.chain.exchange_address)
    }

    pub fn collateral_address(&self) -> AppResult<Address> {
        parse_config_address("collateral", &self.chain.collateral_address)
    }

    pub fn expected_signer(&self) -> AppResult<Option<Address>> {
        self.key
            .expected_address
            .as_deref()
            .map(|addr| parse_config_address("expected signer", addr))
            .transpose()
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.chain.timeout_ms)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle.timeout_ms)
    }

    /// Strategy configuration for the wallet that signs orders.
    pub fn strategy_config(&self, wallet_address: Address) -> AppResult<Configuration> {
        Ok(Configuration::new(
            wallet_address,
            self.exchange_address()?,
            self.collateral_address()?,
        )
        .with_collateral_price(Price::new(self.chain.collateral_price))
        .with_pricing(self.pricing.clone())
        .with_liquidity(self.liquidity.clone()))
    }
}

fn parse_config_address(what: &str, value: &str) -> AppResult<Address> {
    parse_address(value).map_err(|e| AppError::Config(format!("Invalid {what} address: {e}")))
}
