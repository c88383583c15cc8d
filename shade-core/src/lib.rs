//! # SHADE Core
//!
//! Core types, errors, and traits for the SHADE stealth address protocol
//! (ERC-5564 scheme 1 over secp256k1, ERC-6538 meta-addresses).
//!
//! This crate provides the foundational building blocks used by all other SHADE crates:
//!
//! - **Types**: Keys, meta-addresses, Ethereum addresses, and announcements
//! - **Errors**: A single error taxonomy shared by every crate
//! - **Constants**: Protocol constants and sizes
//! - **Traits**: Registry and announcer interfaces
//!
//! ## Example
//!
//! ```rust
//! use shade_core::MetaAddress;
//!
//! let encoded = format!(
//!     "st:eth:0x{}{}",
//!     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
//!     "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
//! );
//! let meta: MetaAddress = encoded.parse().unwrap();
//! assert_eq!(meta.to_string(), encoded);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, ShadeError};
pub use traits::*;
pub use types::*;
