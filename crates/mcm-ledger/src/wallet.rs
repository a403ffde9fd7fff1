//! Wallet: amount conversion and token enablement on top of a `Ledger`.

use crate::error::LedgerResult;
use crate::ledger::Ledger;
use dashmap::DashMap;
use mcm_core::{decimalize, format_address, integerize, Address, Quantity, U256};
use std::sync::Arc;
use tracing::{debug, info};

/// The bot's on-chain identity plus per-token precision.
pub struct Wallet {
    address: Address,
    ledger: Arc<dyn Ledger>,
    /// Token decimals never change; each is read once.
    decimals: DashMap<Address, u8>,
}

impl Wallet {
    pub fn new(address: Address, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            address,
            ledger,
            decimals: DashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub async fn decimals(&self, token: Address) -> LedgerResult<u8> {
        if let Some(cached) = self.decimals.get(&token) {
            return Ok(*cached);
        }
        let decimals = self.ledger.decimals(token).await?;
        debug!(token = %format_address(&token), decimals, "Token decimals cached");
        self.decimals.insert(token, decimals);
        Ok(decimals)
    }

    /// Integer on-chain amount to whole tokens.
    pub async fn decimalize(&self, token: Address, amount: U256) -> LedgerResult<Quantity> {
        let decimals = self.decimals(token).await?;
        Ok(decimalize(amount, decimals)?)
    }

    /// Whole tokens to integer on-chain units, truncating sub-unit fractions.
    pub async fn integerize(&self, token: Address, quantity: Quantity) -> LedgerResult<U256> {
        let decimals = self.decimals(token).await?;
        Ok(integerize(quantity, decimals)?)
    }

    pub async fn balance_of(&self, account: Address, token: Address) -> LedgerResult<U256> {
        self.ledger.balance_of(account, token).await
    }

    /// Grant `spender` an unlimited allowance unless one already exists.
    ///
    /// Returns `true` when an approval was submitted.
    pub async fn enable_token(&self, token: Address, spender: Address) -> LedgerResult<bool> {
        let allowance = self.ledger.allowance(self.address, token, spender).await?;
        if !allowance.is_zero() {
            debug!(
                token = %format_address(&token),
                spender = %format_address(&spender),
                %allowance,
                "Token already enabled"
            );
            return Ok(false);
        }

        info!(
            token = %format_address(&token),
            spender = %format_address(&spender),
            "Approving unlimited allowance"
        );
        self.ledger.approve(token, spender, U256::MAX).await?;
        Ok(true)
    }
}
