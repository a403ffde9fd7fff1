//! Key loading and order signing.
//!
//! # Key Components
//!
//! - [`KeyManager`]: loads the maker's private key from env or file
//! - [`order_hash`]: keccak256 over the packed order fields
//! - [`OrderSigner`]: stamps expiration and nonce, then signs
//! - [`Clock`] / [`NonceSource`]: injectable time and nonce sources

pub mod error;
pub mod nonce;
pub mod signer;

pub use error::{KeyError, SignerError, SignerResult};
pub use nonce::{Clock, FixedClock, FixedNonce, NonceSource, RandomNonce, SystemClock};
pub use signer::{order_hash, KeyManager, KeySource, OrderSigner, ORDER_TTL_SECS};
