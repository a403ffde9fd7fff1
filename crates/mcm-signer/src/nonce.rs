//! Time and nonce sources for order stamping.
//!
//! Both are traits so tests can pin expiration and nonce values.

use alloy::primitives::U256;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // Negative only for a clock set before 1970.
        Utc::now().timestamp().max(0) as u64
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Default)]
pub struct FixedClock {
    secs: AtomicU64,
}

impl FixedClock {
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::AcqRel);
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::Acquire)
    }
}

/// Source of order nonces.
///
/// Nonces only need to be unique per signer. Uniqueness is probabilistic
/// for [`RandomNonce`]; the exchange contract rejects replays.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> U256;
}

/// Uniformly random 64-bit nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn next_nonce(&self) -> U256 {
        U256::from(rand::random::<u64>())
    }
}

/// Sequential nonces starting from a fixed value.
#[derive(Debug, Default)]
pub struct FixedNonce {
    next: AtomicU64,
}

impl FixedNonce {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> U256 {
        U256::from(self.next.fetch_add(1, Ordering::AcqRel))
    }
}
