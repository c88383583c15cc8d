//! # SHADE Cryptography
//!
//! secp256k1 and keccak-256 primitives for ERC-5564 stealth addresses.
//!
//! This crate provides:
//!
//! - **Curve**: key generation, ECDH, point addition, scalar addition mod n
//! - **Hash**: keccak256, shared-secret digests, address derivation
//! - **View Tags**: Computation and constant-time checks for scanning
//! - **Derivation**: Stealth public/private key and address derivation
//!
//! ## Security Properties
//!
//! - Private keys, shared secrets and digests are zeroized on drop
//! - Recipient-side comparisons use `subtle`
//!
//! ## Example
//!
//! ```rust
//! use shade_crypto::{ecdh, generate_keypair, hash_shared_secret};
//!
//! let sender = generate_keypair();
//! let recipient = generate_keypair();
//!
//! let s1 = ecdh(&sender.secret, &recipient.public).unwrap();
//! let s2 = ecdh(&recipient.secret, &sender.public).unwrap();
//! assert_eq!(hash_shared_secret(&s1).view_tag(), hash_shared_secret(&s2).view_tag());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod curve;
pub mod derive;
pub mod hash;
pub mod view_tag;

// Re-export main functions at crate root
pub use curve::{
    add_base_multiple, add_points, derive_public_key, ecdh, ecdh_bytes, generate_keypair,
    generate_keypair_with_rng, generate_private_key, generate_private_key_with_rng,
    scalar_add_mod, scalar_from_digest, SharedSecret,
};
pub use derive::{
    addresses_match, derive_stealth_address, derive_stealth_keys, derive_stealth_private_key,
    derive_stealth_public_key, verify_stealth_address, StealthKeyPair,
};
pub use hash::{address_from_public_key, hash_shared_secret, keccak256, SecretDigest};
pub use view_tag::{compute_view_tag, verify_view_tag, ViewTagStats};
