//! # SHADE Stealth Address Protocol
//!
//! High-level API for creating and discovering stealth payments.
//!
//! This crate provides:
//!
//! - **Stealth Address Creation**: One-time addresses plus the announcement to publish
//! - **Payment Discovery**: Scan announcements and recover the stealth private key
//! - **Wallet**: Recipient key management and viewing-key export
//! - **Traces**: Optional step-by-step record of a derivation
//!
//! ## Quick Start
//!
//! ```rust
//! use shade_stealth::{create_stealth_payment, ShadeWallet};
//!
//! // Recipient: generate keys and publish the meta-address
//! let wallet = ShadeWallet::generate();
//! let meta_address = wallet.meta_address().encode();
//!
//! // Sender: create a stealth payment
//! let payment = create_stealth_payment(&meta_address.parse()?)?;
//!
//! // Recipient: discover it
//! let keys = wallet.try_discover(&payment.announcement)?.expect("payment is ours");
//! assert_eq!(keys.address, payment.stealth_address);
//! # Ok::<(), shade_core::ShadeError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod discovery;
pub mod payment;
pub mod trace;
pub mod wallet;

#[cfg(feature = "parallel")]
pub use discovery::{scan_announcements_parallel, scan_each_parallel};
pub use discovery::{
    scan_announcement, scan_announcement_traced, scan_announcements, try_recover, Discovery,
    ScanBatch, ScanFailure, ScanResult, ScanStats,
};
pub use payment::{
    create_stealth_payment, create_stealth_payment_traced, create_stealth_payment_with_rng,
    verify_payment, StealthPayment, StealthPaymentBuilder,
};
pub use trace::DerivationTrace;
pub use wallet::{ShadeWallet, ViewingKeyExport};
