//! Order hashing and signing.
//!
//! The hash is keccak256 over the packed encoding of
//! `(address, uint256, address, address, uint256, address, uint256, uint256)`
//! in declared `Order` field order. The signature is an EIP-191 personal
//! message signature over the 32 raw hash bytes, so counterparties verify it
//! with a plain `ecrecover` of the prefixed hash.

use crate::error::{KeyError, SignerError, SignerResult};
use crate::nonce::{Clock, NonceSource, RandomNonce, SystemClock};
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::SolValue;
use mcm_core::{format_address, Order, OrderSignature, OrderTerms, SignedOrder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Seconds an order stays valid after it is stamped.
pub const ORDER_TTL_SECS: u64 = 300;

/// Source of the private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Holds the maker's signing key.
///
/// Keys are loaded once at startup. Never log key material.
pub struct KeyManager {
    signer: PrivateKeySigner,
}

impl KeyManager {
    /// Load the key from `source`, optionally checking the derived address.
    pub fn load(source: &KeySource, expected: Option<Address>) -> Result<Self, KeyError> {
        let hex_key = match source {
            KeySource::EnvVar { var_name } => Zeroizing::new(
                std::env::var(var_name).map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
            ),
            KeySource::File { path } => Zeroizing::new(std::fs::read_to_string(path)?),
        };
        Self::from_hex(&hex_key, expected)
    }

    /// Parse a hex key (optional `0x`, surrounding whitespace ignored).
    pub fn from_hex(hex_key: &str, expected: Option<Address>) -> Result<Self, KeyError> {
        let trimmed = hex_key.trim().trim_start_matches("0x");
        let secret: Zeroizing<Vec<u8>> = Zeroizing::new(hex::decode(trimmed)?);
        let signer = PrivateKeySigner::from_slice(&secret)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// Canonical order hash.
pub fn order_hash(order: &Order) -> B256 {
    let packed = (
        order.maker_address,
        order.maker_amount,
        order.maker_token,
        order.taker_address,
        order.taker_amount,
        order.taker_token,
        U256::from(order.expiration),
        order.nonce,
    )
        .abi_encode_packed();
    keccak256(packed)
}

/// Stamps and signs orders for one maker key.
pub struct OrderSigner {
    keys: KeyManager,
    clock: Arc<dyn Clock>,
    nonces: Arc<dyn NonceSource>,
}

impl OrderSigner {
    pub fn new(keys: KeyManager, clock: Arc<dyn Clock>, nonces: Arc<dyn NonceSource>) -> Self {
        Self {
            keys,
            clock,
            nonces,
        }
    }

    /// Wall clock and random nonces.
    pub fn with_defaults(keys: KeyManager) -> Self {
        Self::new(keys, Arc::new(SystemClock), Arc::new(RandomNonce))
    }

    pub fn maker_address(&self) -> Address {
        self.keys.address()
    }

    /// Order for `terms` expiring `ORDER_TTL_SECS` from now.
    pub fn new_order(&self, terms: OrderTerms) -> Order {
        let expiration = self.clock.now_secs() + ORDER_TTL_SECS;
        Order::from_terms(terms, expiration, self.nonces.next_nonce())
    }

    /// Sign `order`. Pure given the order and key.
    pub fn sign(&self, order: Order) -> SignerResult<SignedOrder> {
        let hash = order_hash(&order);
        let signature = self
            .keys
            .signer()
            .sign_message_sync(hash.as_slice())
            .map_err(|e| SignerError::Signing(e.to_string()))?;

        let signature = OrderSignature {
            v: 27 + u8::from(signature.v()),
            r: format!("0x{}", hex::encode(signature.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(signature.s().to_be_bytes::<32>())),
        };
        debug!(
            maker = %format_address(&order.maker_address),
            %hash,
            nonce = %order.nonce,
            expiration = order.expiration,
            "Order signed"
        );
        Ok(SignedOrder { order, signature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::{FixedClock, FixedNonce};
    use alloy::primitives::PrimitiveSignature;
    use std::io::Write;

    /// Well-known development key; address 0xf39F...2266.
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_address() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    fn terms() -> OrderTerms {
        OrderTerms {
            maker_address: test_address(),
            maker_amount: U256::from(148_148u64),
            maker_token: Address::repeat_byte(0x0a),
            taker_address: Address::repeat_byte(0x33),
            taker_amount: U256::from(100_000u64),
            taker_token: Address::repeat_byte(0xdd),
        }
    }

    fn signer() -> OrderSigner {
        OrderSigner::new(
            KeyManager::from_hex(TEST_KEY, None).unwrap(),
            Arc::new(FixedClock::new(1_700_000_000)),
            Arc::new(FixedNonce::new(42)),
        )
    }

    #[test]
    fn test_key_from_hex_variants() {
        let with_prefix = KeyManager::from_hex(TEST_KEY, None).unwrap();
        let bare = KeyManager::from_hex(&format!("  {}\n", &TEST_KEY[2..]), None).unwrap();
        assert_eq!(with_prefix.address(), test_address());
        assert_eq!(bare.address(), test_address());
    }

    #[test]
    fn test_key_address_mismatch() {
        let result = KeyManager::from_hex(TEST_KEY, Some(Address::ZERO));
        assert!(matches!(result, Err(KeyError::AddressMismatch { .. })));
    }

    #[test]
    fn test_key_invalid_hex() {
        let result = KeyManager::from_hex("0xnothex", None);
        assert!(matches!(result, Err(KeyError::HexDecode(_))));
    }

    #[test]
    fn test_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{TEST_KEY}").unwrap();
        let source = KeySource::File {
            path: file.path().to_path_buf(),
        };
        let keys = KeyManager::load(&source, Some(test_address())).unwrap();
        assert_eq!(keys.address(), test_address());
    }

    #[test]
    fn test_key_missing_env_var() {
        let source = KeySource::EnvVar {
            var_name: "MCM_TEST_KEY_THAT_IS_NOT_SET".to_string(),
        };
        assert!(matches!(
            KeyManager::load(&source, None),
            Err(KeyError::EnvVarNotFound(_))
        ));
    }

    #[test]
    fn test_order_hash_matches_packed_layout() {
        let order = signer().new_order(terms());

        let mut packed = Vec::with_capacity(20 * 4 + 32 * 4);
        packed.extend_from_slice(order.maker_address.as_slice());
        packed.extend_from_slice(&order.maker_amount.to_be_bytes::<32>());
        packed.extend_from_slice(order.maker_token.as_slice());
        packed.extend_from_slice(order.taker_address.as_slice());
        packed.extend_from_slice(&order.taker_amount.to_be_bytes::<32>());
        packed.extend_from_slice(order.taker_token.as_slice());
        packed.extend_from_slice(&U256::from(order.expiration).to_be_bytes::<32>());
        packed.extend_from_slice(&order.nonce.to_be_bytes::<32>());

        assert_eq!(packed.len(), 208);
        assert_eq!(order_hash(&order), keccak256(&packed));
    }

    #[test]
    fn test_order_hash_covers_every_field() {
        let order = signer().new_order(terms());
        let base = order_hash(&order);

        let mut changed = order.clone();
        changed.nonce += U256::from(1u64);
        assert_ne!(order_hash(&changed), base);

        let mut changed = order.clone();
        changed.expiration += 1;
        assert_ne!(order_hash(&changed), base);

        let mut changed = order;
        changed.taker_token = Address::repeat_byte(0xde);
        assert_ne!(order_hash(&changed), base);
    }

    #[test]
    fn test_new_order_stamps_expiration_and_nonce() {
        let signer = signer();
        let first = signer.new_order(terms());
        let second = signer.new_order(terms());

        assert_eq!(first.expiration, 1_700_000_000 + ORDER_TTL_SECS);
        assert_eq!(first.nonce, U256::from(42u64));
        assert_eq!(second.nonce, U256::from(43u64));
        assert_eq!(first.maker_amount, U256::from(148_148u64));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = signer();
        let order = signer.new_order(terms());
        let a = signer.sign(order.clone()).unwrap();
        let b = signer.sign(order.clone()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.order, order);
        assert!(a.signature.v == 27 || a.signature.v == 28);
        assert_eq!(a.signature.r.len(), 66);
        assert!(a.signature.s.starts_with("0x"));
    }

    #[test]
    fn test_signature_recovers_maker() {
        let signer = signer();
        let signed = signer.sign(signer.new_order(terms())).unwrap();

        let r = U256::from_be_slice(&hex::decode(&signed.signature.r[2..]).unwrap());
        let s = U256::from_be_slice(&hex::decode(&signed.signature.s[2..]).unwrap());
        let signature = PrimitiveSignature::new(r, s, signed.signature.v == 28);

        let hash = order_hash(&signed.order);
        let recovered = signature
            .recover_address_from_msg(hash.as_slice())
            .unwrap();
        assert_eq!(recovered, signer.maker_address());
    }
}
