//! Address types for SHADE.
//!
//! - [`MetaAddress`]: The dual-key address a recipient publishes (ERC-6538)
//! - [`EthAddress`]: A 20-byte Ethereum address, e.g. a one-time stealth address

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PublicKey;
use crate::constants::{
    COMPRESSED_PUBLIC_KEY_SIZE, ETH_ADDRESS_SIZE, META_ADDRESS_CHAIN_TAG, META_ADDRESS_SCHEME_TAG,
    META_ADDRESS_SIZE,
};
use crate::error::{Result, ShadeError};

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth meta-address: the recipient's spending and viewing public keys.
///
/// Senders derive one-time stealth addresses from it; it carries no private
/// material and is meant to be published.
///
/// # Encoding
/// ```text
/// st:eth:0x<spending (66 hex)><viewing (66 hex)>
/// ```
///
/// Decoding validates both halves as curve points, so a `MetaAddress` value is
/// always usable for payment generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MetaAddress {
    /// Spending public key - base point of every derived stealth key
    pub spending_pk: PublicKey,
    /// Viewing public key - ECDH counterpart for the sender's ephemeral key
    pub viewing_pk: PublicKey,
}

impl MetaAddress {
    /// Creates a meta-address from its two public keys.
    pub fn new(spending_pk: PublicKey, viewing_pk: PublicKey) -> Self {
        Self {
            spending_pk,
            viewing_pk,
        }
    }

    /// Returns the canonical string form.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:0x{}{}",
            META_ADDRESS_SCHEME_TAG,
            META_ADDRESS_CHAIN_TAG,
            self.spending_pk.to_hex(),
            self.viewing_pk.to_hex()
        )
    }

    /// Returns `st:eth:0x<spending>:0x<viewing>`.
    ///
    /// Easier to read in logs; not accepted by [`MetaAddress::decode`].
    pub fn to_debug_string(&self) -> String {
        format!(
            "{}:{}:0x{}:0x{}",
            META_ADDRESS_SCHEME_TAG,
            META_ADDRESS_CHAIN_TAG,
            self.spending_pk.to_hex(),
            self.viewing_pk.to_hex()
        )
    }

    /// Parses the canonical string form.
    ///
    /// Surrounding whitespace is ignored and hex digits may be in either case.
    ///
    /// # Errors
    /// `MalformedMetaAddress` if the tag is not `st:eth`, the `0x` marker is
    /// missing, the payload is not 132 hex digits, or either key is not a
    /// valid compressed point.
    pub fn decode(s: &str) -> Result<Self> {
        let s = s.trim();

        let mut parts = s.splitn(3, ':');
        let scheme = parts.next().unwrap_or_default();
        let chain = parts.next().unwrap_or_default();
        let payload = parts.next().ok_or_else(|| {
            ShadeError::MalformedMetaAddress("expected st:eth:0x<keys>".into())
        })?;

        if scheme != META_ADDRESS_SCHEME_TAG || chain != META_ADDRESS_CHAIN_TAG {
            return Err(ShadeError::MalformedMetaAddress(format!(
                "unknown tag {}:{}",
                scheme, chain
            )));
        }

        let hex_keys = payload
            .strip_prefix("0x")
            .ok_or_else(|| ShadeError::MalformedMetaAddress("missing 0x marker".into()))?;

        if hex_keys.len() != META_ADDRESS_SIZE * 2 {
            return Err(ShadeError::MalformedMetaAddress(format!(
                "expected {} hex digits, got {}",
                META_ADDRESS_SIZE * 2,
                hex_keys.len()
            )));
        }

        let bytes = hex::decode(hex_keys)
            .map_err(|e| ShadeError::MalformedMetaAddress(format!("invalid hex: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Returns `spending || viewing` (66 bytes).
    pub fn to_bytes(&self) -> [u8; META_ADDRESS_SIZE] {
        let mut out = [0u8; META_ADDRESS_SIZE];
        out[..COMPRESSED_PUBLIC_KEY_SIZE].copy_from_slice(&self.spending_pk.to_bytes());
        out[COMPRESSED_PUBLIC_KEY_SIZE..].copy_from_slice(&self.viewing_pk.to_bytes());
        out
    }

    /// Parses `spending || viewing`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != META_ADDRESS_SIZE {
            return Err(ShadeError::MalformedMetaAddress(format!(
                "expected {} bytes, got {}",
                META_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let (spending, viewing) = bytes.split_at(COMPRESSED_PUBLIC_KEY_SIZE);
        let spending_pk = PublicKey::from_bytes(spending)
            .map_err(|e| ShadeError::MalformedMetaAddress(format!("spending key: {}", e)))?;
        let viewing_pk = PublicKey::from_bytes(viewing)
            .map_err(|e| ShadeError::MalformedMetaAddress(format!("viewing key: {}", e)))?;

        Ok(Self::new(spending_pk, viewing_pk))
    }
}

impl std::fmt::Display for MetaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for MetaAddress {
    type Err = ShadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl Serialize for MetaAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for MetaAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A 20-byte Ethereum address.
///
/// Displayed and serialized as `0x` followed by 40 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress {
    bytes: [u8; ETH_ADDRESS_SIZE],
}

impl EthAddress {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ETH_ADDRESS_SIZE {
            return Err(ShadeError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ETH_ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; ETH_ADDRESS_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; ETH_ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ETH_ADDRESS_SIZE] {
        &self.bytes
    }

    /// Returns `0x` + lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Parses from hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(s).map_err(|e| ShadeError::InvalidAddress(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the zero address.
    pub fn zero() -> Self {
        Self {
            bytes: [0u8; ETH_ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl Default for EthAddress {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl std::fmt::Display for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EthAddress {
    type Err = ShadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for EthAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrivateKey;
    use proptest::prelude::*;
    use test_case::test_case;

    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const TWO_G: &str = "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";

    fn sample() -> MetaAddress {
        MetaAddress::new(
            PublicKey::from_hex(G).unwrap(),
            PublicKey::from_hex(TWO_G).unwrap(),
        )
    }

    #[test]
    fn test_encode_layout() {
        let encoded = sample().encode();
        assert_eq!(encoded, format!("st:eth:0x{}{}", G, TWO_G));
        assert_eq!(encoded.len(), 141);
        assert_eq!(sample().to_string(), encoded);
    }

    #[test]
    fn test_debug_string_is_not_canonical() {
        let debug = sample().to_debug_string();
        assert_eq!(debug, format!("st:eth:0x{}:0x{}", G, TWO_G));
        assert!(matches!(
            MetaAddress::decode(&debug),
            Err(ShadeError::MalformedMetaAddress(_))
        ));
    }

    #[test]
    fn test_decode_accepts_uppercase_and_whitespace() {
        let encoded = format!("  st:eth:0x{}{}\n", G.to_uppercase(), TWO_G.to_uppercase());
        let meta: MetaAddress = encoded.parse().unwrap();
        assert_eq!(meta, sample());
    }

    #[test_case("st:btc:0x00" ; "wrong network tag")]
    #[test_case("xx:eth:0x00" ; "wrong scheme tag")]
    #[test_case("st:eth" ; "missing payload")]
    #[test_case("" ; "empty")]
    fn test_decode_rejects_bad_tags(input: &str) {
        assert!(matches!(
            MetaAddress::decode(input),
            Err(ShadeError::MalformedMetaAddress(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_marker() {
        let input = format!("st:eth:{}{}", G, TWO_G);
        assert!(matches!(
            MetaAddress::decode(&input),
            Err(ShadeError::MalformedMetaAddress(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let short = format!("st:eth:0x{}", G);
        assert!(MetaAddress::decode(&short).is_err());

        let long = format!("st:eth:0x{}{}00", G, TWO_G);
        assert!(MetaAddress::decode(&long).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let mut payload = format!("{}{}", G, TWO_G);
        payload.replace_range(10..11, "g");
        let input = format!("st:eth:0x{}", payload);
        assert!(matches!(
            MetaAddress::decode(&input),
            Err(ShadeError::MalformedMetaAddress(_))
        ));
    }

    #[test]
    fn test_decode_rejects_off_curve_half() {
        // x = 5 has no point on secp256k1
        let off_curve = format!("02{:064x}", 5);
        let input = format!("st:eth:0x{}{}", G, off_curve);
        let err = MetaAddress::decode(&input).unwrap_err();
        assert!(matches!(err, ShadeError::MalformedMetaAddress(_)));
        assert!(err.to_string().contains("viewing"));
    }

    #[test]
    fn test_bytes_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(hex::encode(&bytes[..33]), G);
        assert_eq!(hex::encode(&bytes[33..]), TWO_G);
        assert_eq!(MetaAddress::from_bytes(&bytes).unwrap(), sample());
        assert!(MetaAddress::from_bytes(&bytes[..65]).is_err());
    }

    #[test]
    fn test_meta_address_serde() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, format!("\"{}\"", sample().encode()));
        let back: MetaAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    proptest! {
        #[test]
        fn prop_meta_address_roundtrip(spend in any::<[u8; 32]>(), view in any::<[u8; 32]>()) {
            let spend = PrivateKey::from_bytes(&spend);
            let view = PrivateKey::from_bytes(&view);
            prop_assume!(spend.is_ok() && view.is_ok());

            let meta = MetaAddress::new(
                spend.unwrap().public_key(),
                view.unwrap().public_key(),
            );
            prop_assert_eq!(MetaAddress::decode(&meta.encode()).unwrap(), meta);
        }
    }

    #[test]
    fn test_eth_address_formatting() {
        let addr = EthAddress::from_array([0xAB; 20]);
        let s = addr.to_hex();
        assert_eq!(s, format!("0x{}", "ab".repeat(20)));
        assert_eq!(s.len(), 42);
    }

    #[test]
    fn test_eth_address_hex_roundtrip() {
        let addr = EthAddress::from_array([0x12; 20]);
        let addr2: EthAddress = addr.to_hex().to_uppercase().replace("0X", "0x").parse().unwrap();
        assert_eq!(addr, addr2);
    }

    #[test_case("0x1234" ; "too short")]
    #[test_case("0xzz00000000000000000000000000000000000000" ; "bad hex")]
    fn test_eth_address_rejects(input: &str) {
        assert!(matches!(
            EthAddress::from_hex(input),
            Err(ShadeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_eth_address_zero() {
        assert!(EthAddress::zero().is_zero());
        assert!(!EthAddress::from_array([1; 20]).is_zero());
    }
}
