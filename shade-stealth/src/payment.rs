//! Stealth payment creation (sender side).
//!
//! ```text
//! e, E   = fresh ephemeral key pair
//! S      = e · viewing_pk
//! d      = keccak256(S)
//! P      = spending_pk + (d mod n)·G
//! addr   = address(P)
//! emit     Announcement { scheme 1, addr, caller, E, [d[0], extra..] }
//! ```
//!
//! The ephemeral private key never leaves the generation call and is zeroized
//! as soon as the shared secret is computed.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shade_core::constants::SCHEME_ID_SECP256K1;
use shade_core::error::{Result, ShadeError};
use shade_core::types::{Announcement, EthAddress, MetaAddress, PublicKey};
use shade_crypto::{
    address_from_public_key, addresses_match, derive_stealth_public_key, ecdh,
    generate_private_key_with_rng, hash_shared_secret,
};

use crate::trace::DerivationTrace;

/// Stealth payment: address to send to and announcement to publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time address to send funds to
    pub stealth_address: EthAddress,
    /// The one-time public key behind the address
    pub stealth_public_key: PublicKey,
    /// View tag (also `announcement.metadata[0]`)
    pub view_tag: u8,
    /// The announcement to publish
    pub announcement: Announcement,
}

/// Creates a stealth payment for `meta_address` using the OS random source.
pub fn create_stealth_payment(meta_address: &MetaAddress) -> Result<StealthPayment> {
    create_stealth_payment_with_rng(meta_address, &mut OsRng)
}

/// Creates a stealth payment drawing the ephemeral key from `rng`.
pub fn create_stealth_payment_with_rng<R: RngCore + CryptoRng>(
    meta_address: &MetaAddress,
    rng: &mut R,
) -> Result<StealthPayment> {
    let (payment, _) = generate(meta_address, EthAddress::zero(), &[], rng, false)?;
    Ok(payment)
}

/// Creates a stealth payment and returns the intermediate values with it.
pub fn create_stealth_payment_traced<R: RngCore + CryptoRng>(
    meta_address: &MetaAddress,
    rng: &mut R,
) -> Result<(StealthPayment, DerivationTrace)> {
    let (payment, trace) = generate(meta_address, EthAddress::zero(), &[], rng, true)?;
    let trace = trace.ok_or_else(|| ShadeError::ValidationError("trace not captured".into()))?;
    Ok((payment, trace))
}

fn generate<R: RngCore + CryptoRng>(
    meta_address: &MetaAddress,
    caller: EthAddress,
    extra_metadata: &[u8],
    rng: &mut R,
    capture_trace: bool,
) -> Result<(StealthPayment, Option<DerivationTrace>)> {
    let ephemeral_sk = generate_private_key_with_rng(rng);
    let ephemeral_pk = ephemeral_sk.public_key();

    let shared_secret = ecdh(&ephemeral_sk, &meta_address.viewing_pk)?;
    drop(ephemeral_sk);

    let digest = hash_shared_secret(&shared_secret);
    let view_tag = digest.view_tag();

    let stealth_public_key = derive_stealth_public_key(&meta_address.spending_pk, &digest)?;
    let stealth_address = address_from_public_key(&stealth_public_key);

    let mut metadata = Vec::with_capacity(1 + extra_metadata.len());
    metadata.push(view_tag);
    metadata.extend_from_slice(extra_metadata);

    let announcement = Announcement::new(
        SCHEME_ID_SECP256K1,
        stealth_address,
        caller,
        ephemeral_pk.to_bytes().to_vec(),
        metadata,
    );

    let trace = capture_trace.then(|| {
        let mut trace = DerivationTrace::new(ephemeral_pk, shared_secret, digest);
        trace.record_stealth_key(stealth_public_key, stealth_address);
        trace
    });

    debug!(%stealth_address, view_tag, "Created stealth payment");

    Ok((
        StealthPayment {
            stealth_address,
            stealth_public_key,
            view_tag,
            announcement,
        },
        trace,
    ))
}

/// Builder for payments with a caller, extra metadata or a custom RNG.
#[derive(Default)]
pub struct StealthPaymentBuilder {
    meta_address: Option<MetaAddress>,
    caller: Option<EthAddress>,
    extra_metadata: Vec<u8>,
}

impl StealthPaymentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient (required).
    pub fn recipient(mut self, meta_address: MetaAddress) -> Self {
        self.meta_address = Some(meta_address);
        self
    }

    /// Sets the account emitting the announcement.
    pub fn caller(mut self, caller: EthAddress) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Appends bytes after the view tag in the announcement metadata.
    pub fn extra_metadata(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.extra_metadata = bytes.into();
        self
    }

    /// Builds the payment with the OS random source.
    pub fn build(self) -> Result<StealthPayment> {
        self.build_with_rng(&mut OsRng)
    }

    /// Builds the payment drawing the ephemeral key from `rng`.
    pub fn build_with_rng<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<StealthPayment> {
        let (payment, _) = self.run(rng, false)?;
        Ok(payment)
    }

    /// Builds the payment and captures its derivation trace.
    pub fn build_traced<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<(StealthPayment, DerivationTrace)> {
        let (payment, trace) = self.run(rng, true)?;
        let trace = trace.ok_or_else(|| ShadeError::ValidationError("trace not captured".into()))?;
        Ok((payment, trace))
    }

    fn run<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
        capture_trace: bool,
    ) -> Result<(StealthPayment, Option<DerivationTrace>)> {
        let meta_address = self.meta_address.ok_or_else(|| {
            ShadeError::ValidationError("recipient meta-address is required".into())
        })?;

        generate(
            &meta_address,
            self.caller.unwrap_or_default(),
            &self.extra_metadata,
            rng,
            capture_trace,
        )
    }
}

/// Checks that a payment is internally consistent.
///
/// This cannot prove the payment reaches the recipient (that needs the
/// viewing key) but catches tampered or malformed payments.
pub fn verify_payment(payment: &StealthPayment, meta_address: &MetaAddress) -> Result<bool> {
    let announcement = &payment.announcement;
    announcement.validate()?;

    if !announcement.is_supported_scheme() {
        return Ok(false);
    }

    if announcement.view_tag() != Some(payment.view_tag) {
        return Ok(false);
    }

    PublicKey::from_bytes(&announcement.ephemeral_public_key)?;

    let derived = address_from_public_key(&payment.stealth_public_key);
    if !addresses_match(&derived, &payment.stealth_address)
        || !addresses_match(&derived, &announcement.stealth_address)
    {
        return Ok(false);
    }

    Ok(payment.stealth_public_key != meta_address.spending_pk)
}
