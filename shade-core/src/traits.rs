//! Registry interfaces.
//!
//! The protocol core never talks to a chain. Announcement storage (ERC-5564
//! announcer) and meta-address lookup (ERC-6538 registry) are reached through
//! these traits, and callers inject whichever implementation they have.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Announcement, MetaAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOUNCEMENT REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for announcement storage and retrieval.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - A local file (for the CLI)
/// - Indexed contract events (for production)
#[async_trait]
pub trait AnnouncementRegistry: Send + Sync {
    /// Publishes a new announcement to the registry.
    ///
    /// Returns the assigned announcement ID.
    async fn publish(&self, announcement: Announcement) -> Result<u64>;

    /// Returns up to `limit` announcements with `id >= from_id`, ascending by id.
    async fn get_range(&self, from_id: u64, limit: usize) -> Result<Vec<Announcement>>;

    /// Retrieves announcements whose metadata starts with `view_tag`.
    async fn get_by_view_tag(&self, view_tag: u8) -> Result<Vec<Announcement>>;

    /// Retrieves announcements with a block number in `[from, to]`.
    async fn get_by_block_range(&self, from: u64, to: u64) -> Result<Vec<Announcement>>;

    /// Retrieves a specific announcement by ID.
    async fn get_by_id(&self, id: u64) -> Result<Option<Announcement>>;

    /// Returns total announcement count.
    async fn count(&self) -> Result<u64>;

    /// Returns the next available announcement ID.
    async fn next_id(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// META-ADDRESS REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Maps identifiers (account addresses, names) to meta-addresses.
///
/// Identifiers are compared after trimming and lowercasing.
#[async_trait]
pub trait MetaAddressRegistry: Send + Sync {
    /// Registers or replaces the meta-address for `identifier`.
    async fn register(&self, identifier: &str, meta_address: MetaAddress) -> Result<()>;

    /// Looks up the meta-address for `identifier`.
    ///
    /// # Errors
    /// `NotFound` if nothing is registered.
    async fn lookup(&self, identifier: &str) -> Result<MetaAddress>;

    /// Returns true if `identifier` has a registered meta-address.
    async fn is_registered(&self, identifier: &str) -> Result<bool>;
}
