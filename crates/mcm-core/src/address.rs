//! On-chain address validation and formatting.
//!
//! Counterparties exchange addresses as lowercase `0x`-prefixed hex, so
//! everything leaving this process is formatted that way regardless of the
//! checksum casing it arrived with.

use crate::error::{CoreError, Result};
use alloy::primitives::Address;

/// Parse a well-formed `0x` + 40 hex character address.
///
/// Mixed-case input is accepted without checksum verification.
pub fn parse_address(raw: &str) -> Result<Address> {
    let trimmed = raw.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| CoreError::InvalidAddress(format!("{raw}: missing 0x prefix")))?;

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidAddress(format!(
            "{raw}: expected 40 hex characters"
        )));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(hex_part, &mut bytes)
        .map_err(|e| CoreError::InvalidAddress(format!("{raw}: {e}")))?;
    Ok(Address::from(bytes))
}

/// Lowercase `0x`-prefixed hex representation.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Serde helpers for addresses on the wire.
pub mod lower_hex {
    use super::{format_address, parse_address};
    use alloy::primitives::Address;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_address(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_address(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Address>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(addr) => serializer.serialize_str(&format_address(addr)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Address>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse_address(&raw).map_err(de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAI: &str = "0x89d24a6b4ccb1b6faa2625fe562bdd9a23260359";

    #[test]
    fn test_parse_round_trip_lowercase() {
        let addr = parse_address(DAI).unwrap();
        assert_eq!(format_address(&addr), DAI);
    }

    #[test]
    fn test_parse_accepts_checksum_casing() {
        let addr = parse_address("0x89D24A6b4CcB1B6fAA2625fE562bDD9a23260359").unwrap();
        assert_eq!(format_address(&addr), DAI);
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let result = parse_address("89d24a6b4ccb1b6faa2625fe562bdd9a23260359");
        assert!(matches!(result, Err(CoreError::InvalidAddress(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(parse_address("0x89d24a6b").is_err());
        assert!(parse_address(&format!("{DAI}00")).is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!(parse_address("0xzzd24a6b4ccb1b6faa2625fe562bdd9a23260359").is_err());
    }
}
