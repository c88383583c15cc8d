//! Key types for SHADE.
//!
//! This module defines the secp256k1 key structures used in the protocol:
//!
//! - [`PrivateKey`]: 32-byte scalar in `[1, n)`, zeroized on drop
//! - [`PublicKey`]: 33-byte compressed curve point, always valid
//! - [`KeyPair`]: Combined public + private key
//! - [`RecipientKeys`]: Spending + viewing key pairs of one recipient

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{FieldBytes, NonZeroScalar};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use super::MetaAddress;
use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE};
use crate::error::{Result, ShadeError};

// ═══════════════════════════════════════════════════════════════════════════════
// PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// secp256k1 private key: a scalar `k` with `0 < k < n`.
///
/// The inner `k256::SecretKey` zeroizes itself when dropped. This type is
/// deliberately not `Clone`; copies have to go through [`PrivateKey::to_bytes`].
pub struct PrivateKey {
    inner: k256::SecretKey,
}

impl PrivateKey {
    /// Creates a private key from 32 big-endian bytes.
    ///
    /// # Errors
    /// `InvalidKeySize` if the slice is not 32 bytes, `InvalidRange` if the
    /// value is zero or not below the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(ShadeError::InvalidKeySize {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut field_bytes = FieldBytes::default();
        field_bytes.copy_from_slice(bytes);
        let inner = k256::SecretKey::from_bytes(&field_bytes).map_err(|_| ShadeError::InvalidRange);
        field_bytes.as_mut_slice().zeroize();
        Ok(Self { inner: inner? })
    }

    /// Creates a private key from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = Zeroizing::new(hex::decode(s)?);
        Self::from_bytes(&bytes)
    }

    /// Creates a private key from a non-zero scalar.
    pub fn from_scalar(scalar: NonZeroScalar) -> Self {
        Self {
            inner: k256::SecretKey::from(scalar),
        }
    }

    /// Returns the big-endian scalar bytes.
    ///
    /// # Security
    /// The returned buffer is zeroized on drop; do not copy it elsewhere.
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Returns the hex-encoded scalar.
    ///
    /// # Security
    /// Only for key export; never log the result.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(*self.to_bytes()))
    }

    /// Returns the scalar value.
    pub fn to_scalar(&self) -> NonZeroScalar {
        self.inner.to_nonzero_scalar()
    }

    /// Computes `k·G`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(self.inner.public_key())
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose secret key content
        write!(f, "PrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressed secp256k1 public key.
///
/// Construction always validates the point, so every `PublicKey` value is a
/// non-identity point on the curve.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: k256::PublicKey,
}

impl PublicKey {
    /// Parses a 33-byte SEC1 compressed point.
    ///
    /// # Errors
    /// `InvalidPoint` if the length or prefix is wrong or the x-coordinate has
    /// no matching point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(ShadeError::InvalidPoint(format!(
                "expected {} byte compressed key, got {} bytes",
                COMPRESSED_PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }

        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(ShadeError::InvalidPoint(format!(
                "invalid compressed prefix 0x{:02x}",
                bytes[0]
            )));
        }

        let point = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| ShadeError::InvalidPoint("x-coordinate is not on the curve".into()))?;
        Ok(Self { point })
    }

    /// Wraps an already validated curve point.
    pub fn from_point(point: k256::PublicKey) -> Self {
        Self { point }
    }

    /// Returns the underlying curve point.
    pub fn as_point(&self) -> &k256::PublicKey {
        &self.point
    }

    /// Returns the compressed encoding.
    pub fn to_bytes(&self) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        let encoded = self.point.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// Returns the uncompressed encoding (`0x04 || x || y`).
    pub fn to_uncompressed_bytes(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] {
        let encoded = self.point.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_PUBLIC_KEY_SIZE];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// Returns the hex-encoded compressed key (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses a hex-encoded compressed key (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

// Serde implementation that uses hex encoding
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A secp256k1 key pair.
pub struct KeyPair {
    /// Public key (safe to share)
    pub public: PublicKey,
    /// Private key (keep private, auto-zeroized)
    pub secret: PrivateKey,
}

impl KeyPair {
    /// Builds a key pair by deriving the public key from `secret`.
    pub fn from_secret(secret: PrivateKey) -> Self {
        Self {
            public: secret.public_key(),
            secret,
        }
    }

    /// Builds a key pair from a hex-encoded private key.
    pub fn from_secret_hex(s: &str) -> Result<Self> {
        Ok(Self::from_secret(PrivateKey::from_hex(s)?))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECIPIENT KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Spending key pair - controls funds at derived stealth addresses.
pub type SpendingKeyPair = KeyPair;

/// Viewing key pair - used to scan announcements.
///
/// The viewing private key can be shared with a third party (e.g. an auditor)
/// to detect payments without the ability to spend them.
pub type ViewingKeyPair = KeyPair;

/// Complete recipient key set (spending + viewing).
pub struct RecipientKeys {
    /// Keys for spending from stealth addresses
    pub spending: SpendingKeyPair,
    /// Keys for viewing/scanning announcements
    pub viewing: ViewingKeyPair,
}

impl RecipientKeys {
    /// Creates a new recipient key set.
    pub fn new(spending: SpendingKeyPair, viewing: ViewingKeyPair) -> Self {
        Self { spending, viewing }
    }

    /// Returns the publishable meta-address for these keys.
    pub fn meta_address(&self) -> MetaAddress {
        MetaAddress::new(self.spending.public, self.viewing.public)
    }
}

impl std::fmt::Debug for RecipientKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientKeys")
            .field("spending", &self.spending)
            .field("viewing", &self.viewing)
            .finish()
    }
}
