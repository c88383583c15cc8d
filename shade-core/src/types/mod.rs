//! Domain types for SHADE.
//!
//! - [`PrivateKey`] / [`PublicKey`] / [`KeyPair`]: secp256k1 keys
//! - [`MetaAddress`]: Published spending + viewing key pair of a recipient
//! - [`EthAddress`]: 20-byte Ethereum address
//! - [`Announcement`]: Published ephemeral key + view tag for one payment

mod address;
mod announcement;
mod keys;

pub use address::*;
pub use announcement::*;
pub use keys::*;
