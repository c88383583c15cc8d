//! secp256k1 scalar and point primitives.
//!
//! Everything here is a thin layer over `k256` that speaks the protocol's
//! encodings: 32-byte big-endian scalars and 33-byte compressed points.
//!
//! ```text
//! ecdh(a, B)         = a·B                  (compressed, 33 bytes)
//! add_points(P, Q)   = P + Q                (identity is an error)
//! scalar_add_mod(a, b) = (a + b) mod n
//! ```

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, U256};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use shade_core::constants::{COMPRESSED_PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE};
use shade_core::error::{Result, ShadeError};
use shade_core::types::{KeyPair, PrivateKey, PublicKey};

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED SECRET
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw ECDH output: the shared point in compressed form.
///
/// Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; COMPRESSED_PUBLIC_KEY_SIZE]);

impl SharedSecret {
    #[cfg(test)]
    pub(crate) fn from_array(bytes: [u8; COMPRESSED_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the compressed point bytes.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        subtle::ConstantTimeEq::ct_eq(&self.0[..], &other.0[..]).into()
    }
}

impl Eq for SharedSecret {}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates a private key from the OS random source.
pub fn generate_private_key() -> PrivateKey {
    generate_private_key_with_rng(&mut OsRng)
}

/// Generates a private key from the given random source.
///
/// Candidates that are zero or not below the curve order are discarded and
/// redrawn, so the caller never sees `InvalidRange`.
pub fn generate_private_key_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> PrivateKey {
    let mut candidate = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
    loop {
        rng.fill_bytes(&mut candidate[..]);
        if let Ok(key) = PrivateKey::from_bytes(&candidate[..]) {
            return key;
        }
    }
}

/// Computes `k·G`.
pub fn derive_public_key(private_key: &PrivateKey) -> PublicKey {
    private_key.public_key()
}

/// Generates a fresh key pair from the OS random source.
pub fn generate_keypair() -> KeyPair {
    KeyPair::from_secret(generate_private_key())
}

/// Generates a key pair from the given random source.
pub fn generate_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> KeyPair {
    KeyPair::from_secret(generate_private_key_with_rng(rng))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIFFIE-HELLMAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes `a·B` in compressed form.
///
/// `ecdh(a, b·G) == ecdh(b, a·G)`.
pub fn ecdh(private_key: &PrivateKey, public_key: &PublicKey) -> Result<SharedSecret> {
    let shared = public_key.as_point().to_projective() * *private_key.to_scalar();
    let point = to_public_key(shared)?;

    let encoded = point.to_encoded_point(true);
    let mut bytes = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
    bytes.copy_from_slice(encoded.as_bytes());
    Ok(SharedSecret(bytes))
}

/// Like [`ecdh`], decoding the counterparty key from raw bytes first.
///
/// # Errors
/// `InvalidPoint` if `public_key` is not a compressed curve point.
pub fn ecdh_bytes(private_key: &PrivateKey, public_key: &[u8]) -> Result<SharedSecret> {
    let public_key = PublicKey::from_bytes(public_key)?;
    ecdh(private_key, &public_key)
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINT AND SCALAR ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes `P + Q`.
///
/// # Errors
/// `PointAtInfinity` if `Q == -P`.
pub fn add_points(p: &PublicKey, q: &PublicKey) -> Result<PublicKey> {
    let sum = p.as_point().to_projective() + q.as_point().to_projective();
    Ok(PublicKey::from_point(to_public_key(sum)?))
}

/// Computes `P + s·G`.
///
/// `s` may be zero, in which case `P` is returned.
pub fn add_base_multiple(p: &PublicKey, s: &Scalar) -> Result<PublicKey> {
    let sum = p.as_point().to_projective() + ProjectivePoint::GENERATOR * s;
    Ok(PublicKey::from_point(to_public_key(sum)?))
}

/// Computes `(a + b) mod n` on big-endian scalars.
///
/// Both inputs are reduced first, so any 32-byte values are accepted and the
/// result is always below the curve order.
pub fn scalar_add_mod(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let sum = reduce(a) + reduce(b);
    let mut out = [0u8; 32];
    out.copy_from_slice(&sum.to_bytes());
    out
}

/// Interprets a 32-byte digest as a big-endian integer and reduces it mod n.
pub fn scalar_from_digest(digest: &[u8; 32]) -> Scalar {
    reduce(digest)
}

fn reduce(bytes: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*bytes))
}

fn to_public_key(point: ProjectivePoint) -> Result<k256::PublicKey> {
    k256::PublicKey::from_affine(AffinePoint::from(point)).map_err(|_| ShadeError::PointAtInfinity)
}
