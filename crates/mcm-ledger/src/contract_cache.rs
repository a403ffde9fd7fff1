//! Market contract snapshot cache.
//!
//! The seven market constants are read once per process. On-chain parameter
//! changes are never picked up by `load`; `verify_unchanged` is the explicit
//! check for that assumption.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ConstantValue, ContractConstant, Ledger};
use mcm_core::{format_address, parse_address, Address, ContractSnapshot, U256};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Lazily loaded, never invalidated snapshot of one market contract.
pub struct ContractCache {
    address: Address,
    ledger: Arc<dyn Ledger>,
    snapshot: OnceCell<Arc<ContractSnapshot>>,
}

impl ContractCache {
    /// Validates `address` before any ledger access.
    pub fn new(address: &str, ledger: Arc<dyn Ledger>) -> LedgerResult<Self> {
        Ok(Self::from_address(parse_address(address)?, ledger))
    }

    pub fn from_address(address: Address, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            address,
            ledger,
            snapshot: OnceCell::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Cached snapshot, if a load has succeeded.
    pub fn get(&self) -> Option<Arc<ContractSnapshot>> {
        self.snapshot.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.initialized()
    }

    /// Return the snapshot, reading it from the ledger on first use.
    ///
    /// Concurrent first callers wait on a single load. A failed load leaves
    /// the cache empty so the next caller retries.
    pub async fn load(&self) -> LedgerResult<Arc<ContractSnapshot>> {
        self.snapshot
            .get_or_try_init(|| async {
                let snapshot = read_snapshot(self.ledger.as_ref(), self.address).await?;
                info!(
                    market = %format_address(&self.address),
                    long = %format_address(&snapshot.long_token_address),
                    short = %format_address(&snapshot.short_token_address),
                    cap = %snapshot.price_cap,
                    floor = %snapshot.price_floor,
                    decimal_places = snapshot.price_decimal_places,
                    oracle = %snapshot.oracle_url,
                    "Market contract loaded"
                );
                Ok::<_, LedgerError>(Arc::new(snapshot))
            })
            .await
            .cloned()
    }

    /// Re-read the constants and compare them with the cached snapshot.
    ///
    /// Does nothing when nothing has been loaded yet.
    pub async fn verify_unchanged(&self) -> LedgerResult<()> {
        let Some(cached) = self.get() else {
            return Ok(());
        };
        let current = read_snapshot(self.ledger.as_ref(), self.address).await?;
        if current != *cached {
            let msg = format!(
                "{}: cap {}->{}, floor {}->{}, decimal places {}->{}, oracle {}->{}",
                format_address(&self.address),
                cached.price_cap,
                current.price_cap,
                cached.price_floor,
                current.price_floor,
                cached.price_decimal_places,
                current.price_decimal_places,
                cached.oracle_url,
                current.oracle_url,
            );
            error!(%msg, "MARKET PARAMETER CHANGE DETECTED");
            return Err(LedgerError::SnapshotDrift(msg));
        }
        Ok(())
    }
}

/// Read all seven constants concurrently and build a snapshot.
async fn read_snapshot(ledger: &dyn Ledger, address: Address) -> LedgerResult<ContractSnapshot> {
    use ContractConstant::*;

    let (long, short, cap, floor, places, oracle_url, oracle_statistic) = tokio::try_join!(
        ledger.read_constant(address, LongPositionToken),
        ledger.read_constant(address, ShortPositionToken),
        ledger.read_constant(address, PriceCap),
        ledger.read_constant(address, PriceFloor),
        ledger.read_constant(address, PriceDecimalPlaces),
        ledger.read_constant(address, OracleUrl),
        ledger.read_constant(address, OracleStatistic),
    )?;

    Ok(ContractSnapshot::new(
        address,
        long.into_address(LongPositionToken)?,
        short.into_address(ShortPositionToken)?,
        cap.into_uint(PriceCap)?,
        floor.into_uint(PriceFloor)?,
        decimal_places(places)?,
        oracle_url.into_text(OracleUrl)?,
        oracle_statistic.into_text(OracleStatistic)?,
    )?)
}

fn decimal_places(value: ConstantValue) -> LedgerResult<u8> {
    let raw = value.into_uint(ContractConstant::PriceDecimalPlaces)?;
    if raw > U256::from(u8::MAX) {
        return Err(LedgerError::Decode {
            what: ContractConstant::PriceDecimalPlaces.to_string(),
            reason: format!("{raw} does not fit in u8"),
        });
    }
    Ok(raw.as_limbs()[0] as u8)
}
