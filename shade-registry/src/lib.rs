//! # SHADE Registry
//!
//! Announcement storage and meta-address lookup for the SHADE protocol.
//!
//! This crate provides:
//!
//! - **Memory**: Fast in-memory announcement storage for development and testing
//! - **File**: Persistent announcement storage for the CLI and single-node use
//! - **Directory**: In-memory identifier → meta-address lookup
//!
//! ## Example
//!
//! ```rust,ignore
//! use shade_registry::{MemoryRegistry, Registry};
//!
//! let registry = MemoryRegistry::new();
//! let id = registry.publish(payment.announcement).await?;
//! let page = registry.get_range(id, 100).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod directory;
mod file;
mod memory;

pub use directory::MemoryDirectory;
pub use file::FileRegistry;
pub use memory::MemoryRegistry;

// Re-export the traits from core
pub use shade_core::traits::AnnouncementRegistry as Registry;
pub use shade_core::traits::MetaAddressRegistry;
