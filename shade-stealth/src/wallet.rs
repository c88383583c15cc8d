//! SHADE wallet implementation.
//!
//! The wallet holds a recipient's key pairs and exposes the receiving side of
//! the protocol: the meta-address to publish and announcement discovery.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use shade_core::error::{Result, ShadeError};
use shade_core::types::{Announcement, EthAddress, MetaAddress, PrivateKey, PublicKey, RecipientKeys};
use shade_crypto::{
    addresses_match, derive_stealth_address, ecdh, generate_keypair, generate_keypair_with_rng,
    hash_shared_secret, verify_view_tag, StealthKeyPair,
};

use crate::discovery::{scan_announcements, try_recover, ScanBatch};

/// A SHADE wallet containing keys for receiving private payments.
///
/// The wallet holds:
/// - Spending keys: For deriving stealth private keys and spending funds
/// - Viewing keys: For scanning announcements (can be shared with auditors)
pub struct ShadeWallet {
    keys: RecipientKeys,
    meta_address: MetaAddress,
}

impl ShadeWallet {
    /// Generates a new wallet with random keys.
    pub fn generate() -> Self {
        Self::from_keys(RecipientKeys::new(generate_keypair(), generate_keypair()))
    }

    /// Generates a new wallet drawing both key pairs from `rng`.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let spending = generate_keypair_with_rng(rng);
        let viewing = generate_keypair_with_rng(rng);
        Self::from_keys(RecipientKeys::new(spending, viewing))
    }

    /// Creates a wallet from existing keys.
    pub fn from_keys(keys: RecipientKeys) -> Self {
        let meta_address = keys.meta_address();
        Self { keys, meta_address }
    }

    /// Returns the meta-address for publishing.
    pub fn meta_address(&self) -> &MetaAddress {
        &self.meta_address
    }

    /// Returns the wallet's key pairs.
    pub fn keys(&self) -> &RecipientKeys {
        &self.keys
    }

    /// Consumes the wallet and returns its key pairs.
    pub fn into_keys(self) -> RecipientKeys {
        self.keys
    }

    /// Attempts to recover the stealth keys of one announcement.
    ///
    /// `Ok(None)` means the announcement is not ours.
    pub fn try_discover(&self, announcement: &Announcement) -> Result<Option<StealthKeyPair>> {
        try_recover(announcement, &self.keys.viewing.secret, &self.keys.spending.secret)
    }

    /// Scans a batch of announcements.
    pub fn scan(&self, announcements: &[Announcement]) -> ScanBatch {
        scan_announcements(announcements, &self.keys)
    }

    /// Exports the viewing key for third-party auditing.
    ///
    /// The export can detect payments but not spend them.
    pub fn export_viewing_key(&self) -> ViewingKeyExport {
        ViewingKeyExport {
            viewing_private_key: self.keys.viewing.secret.to_hex().to_string(),
            spending_public_key: self.keys.spending.public,
        }
    }
}

impl std::fmt::Debug for ShadeWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadeWallet")
            .field("meta_address", &self.meta_address)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// Viewing secret plus spending public key.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ViewingKeyExport {
    /// Viewing private key (hex, no prefix)
    pub viewing_private_key: String,
    /// Spending public key
    #[zeroize(skip)]
    pub spending_public_key: PublicKey,
}

impl ViewingKeyExport {
    /// Checks whether `announcement` pays the exporting wallet.
    ///
    /// Returns the stealth address on a match. A view-tag match whose address
    /// disagrees is a `RecoveryMismatch`.
    pub fn detect(&self, announcement: &Announcement) -> Result<Option<EthAddress>> {
        if !announcement.is_supported_scheme() {
            return Err(ShadeError::UnsupportedScheme(announcement.scheme_id));
        }
        let tag = announcement.view_tag().ok_or_else(|| {
            ShadeError::InvalidAnnouncement("metadata is empty (no view tag)".into())
        })?;

        let viewing_sk = PrivateKey::from_hex(&self.viewing_private_key)?;
        let ephemeral_pk = PublicKey::from_bytes(&announcement.ephemeral_public_key)?;
        let digest = hash_shared_secret(&ecdh(&viewing_sk, &ephemeral_pk)?);

        if !verify_view_tag(&digest, tag) {
            return Ok(None);
        }

        let derived = derive_stealth_address(&self.spending_public_key, &digest)?;
        if !addresses_match(&derived, &announcement.stealth_address) {
            return Err(ShadeError::RecoveryMismatch {
                expected: announcement.stealth_address.to_hex(),
                derived: derived.to_hex(),
            });
        }
        Ok(Some(derived))
    }
}

impl std::fmt::Debug for ViewingKeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKeyExport")
            .field("viewing_private_key", &"[REDACTED]")
            .field("spending_public_key", &self.spending_public_key)
            .finish()
    }
}
