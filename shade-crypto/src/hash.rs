//! Keccak-256 hashing.
//!
//! Two uses in the protocol:
//!
//! ```text
//! digest  = keccak256(shared_point_compressed)       (33 bytes in, hashed once)
//! address = keccak256(uncompressed_pubkey[1..65])[12..32]
//! ```
//!
//! Note: Keccak256 is NOT SHA3-256. They use different padding.

use sha3::{Digest, Keccak256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use k256::Scalar;
use shade_core::constants::{ETH_ADDRESS_SIZE, KECCAK256_SIZE};
use shade_core::types::{EthAddress, PublicKey};

use crate::curve::{scalar_from_digest, SharedSecret};

/// Computes Keccak256.
pub fn keccak256(input: &[u8]) -> [u8; KECCAK256_SIZE] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Hash of a shared secret. Byte 0 is the view tag; the whole digest reduced
/// mod n is the stealth scalar.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretDigest([u8; KECCAK256_SIZE]);

impl SecretDigest {
    #[cfg(test)]
    pub(crate) fn from_array(bytes: [u8; KECCAK256_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest.
    pub fn as_bytes(&self) -> &[u8; KECCAK256_SIZE] {
        &self.0
    }

    /// Returns the view tag (first digest byte, before any reduction).
    pub fn view_tag(&self) -> u8 {
        self.0[0]
    }

    /// Returns the digest reduced modulo the curve order.
    pub fn to_scalar(&self) -> Scalar {
        scalar_from_digest(&self.0)
    }
}

impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretDigest(view_tag={:#04x}, [REDACTED])", self.view_tag())
    }
}

/// Hashes the 33-byte compressed shared point.
pub fn hash_shared_secret(shared_secret: &SharedSecret) -> SecretDigest {
    SecretDigest(keccak256(shared_secret.as_bytes()))
}

/// Derives the Ethereum address of a public key.
pub fn address_from_public_key(public_key: &PublicKey) -> EthAddress {
    let uncompressed = public_key.to_uncompressed_bytes();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; ETH_ADDRESS_SIZE];
    address.copy_from_slice(&hash[KECCAK256_SIZE - ETH_ADDRESS_SIZE..]);
    EthAddress::from_array(address)
}
