//! Stealth key and address derivation.
//!
//! ## Derivation Flow
//!
//! ```text
//! digest        = keccak256(S)
//! s             = digest mod n
//! stealth_pk    = spending_pk + s·G
//! stealth_addr  = address(stealth_pk)
//! ```
//!
//! ## Private Key Derivation
//!
//! Only the recipient can compute the matching private key:
//!
//! ```text
//! stealth_sk = (spending_sk + s) mod n
//! ```

use shade_core::error::{Result, ShadeError};
use shade_core::types::{EthAddress, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::curve::{add_base_multiple, scalar_add_mod};
use crate::hash::{address_from_public_key, SecretDigest};

/// A recovered one-time key pair.
#[derive(Debug)]
pub struct StealthKeyPair {
    /// The stealth address the funds sit at
    pub address: EthAddress,
    /// The stealth public key
    pub public_key: PublicKey,
    /// The stealth private key (zeroized on drop)
    pub private_key: PrivateKey,
}

/// Computes `spending_pk + s·G`.
pub fn derive_stealth_public_key(spending_pk: &PublicKey, digest: &SecretDigest) -> Result<PublicKey> {
    add_base_multiple(spending_pk, &digest.to_scalar())
}

/// Computes the stealth address a sender pays to.
pub fn derive_stealth_address(spending_pk: &PublicKey, digest: &SecretDigest) -> Result<EthAddress> {
    let stealth_pk = derive_stealth_public_key(spending_pk, digest)?;
    Ok(address_from_public_key(&stealth_pk))
}

/// Computes `(spending_sk + s) mod n`.
///
/// # Errors
/// `PointAtInfinity` if the sum is zero, i.e. the stealth public key would be
/// the identity.
pub fn derive_stealth_private_key(spending_sk: &PrivateKey, digest: &SecretDigest) -> Result<PrivateKey> {
    let sum = Zeroizing::new(scalar_add_mod(&spending_sk.to_bytes(), digest.as_bytes()));
    PrivateKey::from_bytes(&sum[..]).map_err(|e| match e {
        ShadeError::InvalidRange => ShadeError::PointAtInfinity,
        other => other,
    })
}

/// Derives the full stealth key pair from the recipient's spending key.
pub fn derive_stealth_keys(spending_sk: &PrivateKey, digest: &SecretDigest) -> Result<StealthKeyPair> {
    let private_key = derive_stealth_private_key(spending_sk, digest)?;
    let public_key = private_key.public_key();
    let address = address_from_public_key(&public_key);

    Ok(StealthKeyPair {
        address,
        public_key,
        private_key,
    })
}

/// Compares two addresses in constant time.
pub fn addresses_match(a: &EthAddress, b: &EthAddress) -> bool {
    subtle::ConstantTimeEq::ct_eq(&a.as_bytes()[..], &b.as_bytes()[..]).into()
}

/// Verifies that `expected` is the stealth address for `spending_pk` and `digest`.
pub fn verify_stealth_address(
    spending_pk: &PublicKey,
    digest: &SecretDigest,
    expected: &EthAddress,
) -> Result<bool> {
    let derived = derive_stealth_address(spending_pk, digest)?;
    Ok(addresses_match(&derived, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{ecdh, generate_keypair};
    use crate::hash::hash_shared_secret;

    use shade_core::constants::CURVE_ORDER;

    fn random_digest() -> SecretDigest {
        let ephemeral = generate_keypair();
        let viewing = generate_keypair();
        hash_shared_secret(&ecdh(&ephemeral.secret, &viewing.public).unwrap())
    }

    #[test]
    fn test_private_key_controls_public_key() {
        let spending = generate_keypair();
        let digest = random_digest();

        let stealth_pk = derive_stealth_public_key(&spending.public, &digest).unwrap();
        let keys = derive_stealth_keys(&spending.secret, &digest).unwrap();

        assert_eq!(keys.public_key, stealth_pk);
        assert_eq!(keys.address, address_from_public_key(&stealth_pk));
    }

    #[test]
    fn test_stealth_address_differs_from_spending_address() {
        let spending = generate_keypair();
        let digest = random_digest();

        let stealth = derive_stealth_address(&spending.public, &digest).unwrap();
        assert_ne!(stealth, address_from_public_key(&spending.public));
    }

    #[test]
    fn test_verify_stealth_address() {
        let spending = generate_keypair();
        let digest = random_digest();
        let address = derive_stealth_address(&spending.public, &digest).unwrap();

        assert!(verify_stealth_address(&spending.public, &digest, &address).unwrap());

        let wrong = EthAddress::from_array([0xFF; 20]);
        assert!(!verify_stealth_address(&spending.public, &digest, &wrong).unwrap());
    }

    #[test]
    fn test_other_spending_key_derives_other_address() {
        let spending = generate_keypair();
        let other = generate_keypair();
        let digest = random_digest();

        let expected = derive_stealth_address(&spending.public, &digest).unwrap();
        let keys = derive_stealth_keys(&other.secret, &digest).unwrap();
        assert!(!addresses_match(&keys.address, &expected));
    }

    #[test]
    fn test_stealth_private_key_debug_redacted() {
        let spending = generate_keypair();
        let keys = derive_stealth_keys(&spending.secret, &random_digest()).unwrap();
        assert!(format!("{:?}", keys).contains("REDACTED"));
    }

    #[test]
    fn test_zero_sum_is_point_at_infinity() {
        let mut k = [0u8; 32];
        k[31] = 9;
        let spending_sk = PrivateKey::from_bytes(&k).unwrap();

        // digest = n - 9, so spending_sk + digest = 0 mod n
        let mut neg = CURVE_ORDER;
        neg[31] -= 9;
        let digest = SecretDigest::from_array(neg);

        assert!(matches!(
            derive_stealth_private_key(&spending_sk, &digest),
            Err(ShadeError::PointAtInfinity)
        ));
        assert!(matches!(
            derive_stealth_public_key(&spending_sk.public_key(), &digest),
            Err(ShadeError::PointAtInfinity)
        ));
    }
}
