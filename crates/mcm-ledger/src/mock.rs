//! In-memory ledger.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{BoxFuture, ConstantValue, ContractConstant, Ledger};
use mcm_core::{format_address, Address, ContractSnapshot, U256};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ledger backed by hash maps, for tests and dry runs.
///
/// Approvals are applied on behalf of `owner`.
#[derive(Debug)]
pub struct MockLedger {
    owner: Address,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    decimals: Mutex<HashMap<Address, u8>>,
    allowances: Mutex<HashMap<(Address, Address, Address), U256>>,
    constants: Mutex<HashMap<(Address, ContractConstant), ConstantValue>>,
    approvals: Mutex<Vec<(Address, Address, U256)>>,
    constant_reads: AtomicU64,
    decimals_reads: AtomicU64,
    fail_approvals: Mutex<bool>,
}

impl MockLedger {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            balances: Mutex::new(HashMap::new()),
            decimals: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            constants: Mutex::new(HashMap::new()),
            approvals: Mutex::new(Vec::new()),
            constant_reads: AtomicU64::new(0),
            decimals_reads: AtomicU64::new(0),
            fail_approvals: Mutex::new(false),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn set_balance(&self, account: Address, token: Address, amount: U256) {
        self.balances.lock().insert((account, token), amount);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.decimals.lock().insert(token, decimals);
    }

    pub fn set_allowance(&self, owner: Address, token: Address, spender: Address, amount: U256) {
        self.allowances.lock().insert((owner, token, spender), amount);
    }

    pub fn set_constant(&self, contract: Address, constant: ContractConstant, value: ConstantValue) {
        self.constants.lock().insert((contract, constant), value);
    }

    /// Register every constant of `snapshot` under its contract address.
    pub fn install_market(&self, snapshot: &ContractSnapshot) {
        let contract = snapshot.address;
        let values = [
            (
                ContractConstant::LongPositionToken,
                ConstantValue::Address(snapshot.long_token_address),
            ),
            (
                ContractConstant::ShortPositionToken,
                ConstantValue::Address(snapshot.short_token_address),
            ),
            (ContractConstant::PriceCap, ConstantValue::Uint(snapshot.price_cap)),
            (ContractConstant::PriceFloor, ConstantValue::Uint(snapshot.price_floor)),
            (
                ContractConstant::PriceDecimalPlaces,
                ConstantValue::Uint(U256::from(snapshot.price_decimal_places)),
            ),
            (
                ContractConstant::OracleUrl,
                ConstantValue::Text(snapshot.oracle_url.clone()),
            ),
            (
                ContractConstant::OracleStatistic,
                ConstantValue::Text(snapshot.oracle_statistic.clone()),
            ),
        ];
        let mut constants = self.constants.lock();
        for (constant, value) in values {
            constants.insert((contract, constant), value);
        }
    }

    /// Make every subsequent `approve` fail.
    pub fn fail_approvals(&self) {
        *self.fail_approvals.lock() = true;
    }

    /// Approvals granted so far as `(token, spender, amount)`.
    pub fn approvals(&self) -> Vec<(Address, Address, U256)> {
        self.approvals.lock().clone()
    }

    pub fn constant_reads(&self) -> u64 {
        self.constant_reads.load(Ordering::Relaxed)
    }

    pub fn decimals_reads(&self) -> u64 {
        self.decimals_reads.load(Ordering::Relaxed)
    }
}

impl Ledger for MockLedger {
    fn balance_of(&self, account: Address, token: Address) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            Ok(self
                .balances
                .lock()
                .get(&(account, token))
                .copied()
                .unwrap_or(U256::ZERO))
        })
    }

    fn decimals(&self, token: Address) -> BoxFuture<'_, LedgerResult<u8>> {
        Box::pin(async move {
            self.decimals_reads.fetch_add(1, Ordering::Relaxed);
            self.decimals
                .lock()
                .get(&token)
                .copied()
                .ok_or_else(|| LedgerError::NotFound(format!("decimals of {}", format_address(&token))))
        })
    }

    fn allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            Ok(self
                .allowances
                .lock()
                .get(&(owner, token, spender))
                .copied()
                .unwrap_or(U256::ZERO))
        })
    }

    fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> BoxFuture<'_, LedgerResult<()>> {
        Box::pin(async move {
            if *self.fail_approvals.lock() {
                return Err(LedgerError::Rpc("approval rejected".to_string()));
            }
            self.allowances
                .lock()
                .insert((self.owner, token, spender), amount);
            self.approvals.lock().push((token, spender, amount));
            Ok(())
        })
    }

    fn read_constant(
        &self,
        contract: Address,
        constant: ContractConstant,
    ) -> BoxFuture<'_, LedgerResult<ConstantValue>> {
        Box::pin(async move {
            self.constant_reads.fetch_add(1, Ordering::Relaxed);
            self.constants
                .lock()
                .get(&(contract, constant))
                .cloned()
                .ok_or_else(|| {
                    LedgerError::NotFound(format!(
                        "{constant} on {}",
                        format_address(&contract)
                    ))
                })
        })
    }
}
