//! Step-by-step record of one stealth derivation.
//!
//! A trace is returned next to a payment or scan result when the caller asks
//! for it. It never contains the ephemeral private key.

use std::fmt;

use zeroize::ZeroizeOnDrop;

use shade_core::types::{EthAddress, PublicKey};
use shade_crypto::{SecretDigest, SharedSecret};

/// Intermediate values of a derivation.
///
/// Secret fields are zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct DerivationTrace {
    /// Sender's ephemeral public key
    #[zeroize(skip)]
    pub ephemeral_public_key: PublicKey,
    /// ECDH output (compressed point)
    pub shared_secret: SharedSecret,
    /// keccak256 of the shared secret
    pub digest: SecretDigest,
    /// First digest byte
    pub view_tag: u8,
    /// Digest reduced mod n, big-endian
    pub scalar: [u8; 32],
    /// `spending_pk + scalar·G`; absent on the recipient side until the view tag matched
    #[zeroize(skip)]
    pub stealth_public_key: Option<PublicKey>,
    /// Address of the stealth public key
    #[zeroize(skip)]
    pub stealth_address: Option<EthAddress>,
}

impl DerivationTrace {
    pub(crate) fn new(
        ephemeral_public_key: PublicKey,
        shared_secret: SharedSecret,
        digest: SecretDigest,
    ) -> Self {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&digest.to_scalar().to_bytes());

        Self {
            ephemeral_public_key,
            view_tag: digest.view_tag(),
            shared_secret,
            digest,
            scalar,
            stealth_public_key: None,
            stealth_address: None,
        }
    }

    pub(crate) fn record_stealth_key(&mut self, public_key: PublicKey, address: EthAddress) {
        self.stealth_public_key = Some(public_key);
        self.stealth_address = Some(address);
    }

    /// Returns true once the stealth key was derived.
    pub fn is_complete(&self) -> bool {
        self.stealth_public_key.is_some()
    }
}

impl fmt::Debug for DerivationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationTrace")
            .field("ephemeral_public_key", &self.ephemeral_public_key)
            .field("view_tag", &self.view_tag)
            .field("stealth_address", &self.stealth_address)
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

/// Renders every step, secrets included. Meant for local debugging output.
impl fmt::Display for DerivationTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ephemeral public key : {}", self.ephemeral_public_key)?;
        writeln!(f, "shared secret (S)    : 0x{}", hex::encode(self.shared_secret.as_bytes()))?;
        writeln!(f, "keccak256(S)         : 0x{}", hex::encode(self.digest.as_bytes()))?;
        writeln!(f, "view tag             : 0x{:02x}", self.view_tag)?;
        write!(f, "scalar (mod n)       : 0x{}", hex::encode(self.scalar))?;

        if let (Some(pk), Some(address)) = (&self.stealth_public_key, &self.stealth_address) {
            writeln!(f)?;
            writeln!(f, "stealth public key   : {}", pk)?;
            write!(f, "stealth address      : {}", address)?;
        }

        Ok(())
    }
}
