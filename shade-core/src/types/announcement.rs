//! Announcement types.
//!
//! Announcements are emitted by senders (ERC-5564 `Announcement` event) and
//! carry the ephemeral public key and view tag a recipient needs to detect a
//! payment.

use serde::{Deserialize, Serialize};

use super::EthAddress;
use crate::constants::{COMPRESSED_PUBLIC_KEY_SIZE, SCHEME_ID_SECP256K1, VIEW_TAG_SPACE};
use crate::error::{Result, ShadeError};

/// A published stealth payment announcement.
///
/// `metadata[0]` is the view tag; any further bytes are opaque to the
/// protocol. The ephemeral key is kept as raw bytes since announcements come
/// from untrusted sources; scanning rejects bytes that are not a curve point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Unique identifier (assigned by registry)
    #[serde(default)]
    pub id: u64,
    /// Stealth scheme identifier (1 = secp256k1)
    pub scheme_id: u64,
    /// One-time address the payment was sent to
    pub stealth_address: EthAddress,
    /// Account that emitted the announcement
    pub caller: EthAddress,
    /// Sender's ephemeral public key, compressed
    #[serde(with = "hex")]
    pub ephemeral_public_key: Vec<u8>,
    /// View tag followed by optional extra bytes
    #[serde(with = "hex")]
    pub metadata: Vec<u8>,
    /// Block number if observed on-chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Transaction hash if observed on-chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl Announcement {
    /// Creates a new announcement. The id is assigned on publish.
    pub fn new(
        scheme_id: u64,
        stealth_address: EthAddress,
        caller: EthAddress,
        ephemeral_public_key: Vec<u8>,
        metadata: Vec<u8>,
    ) -> Self {
        Self {
            id: 0,
            scheme_id,
            stealth_address,
            caller,
            ephemeral_public_key,
            metadata,
            block_number: None,
            tx_hash: None,
        }
    }

    /// Returns the view tag, or `None` if the metadata is empty.
    pub fn view_tag(&self) -> Option<u8> {
        self.metadata.first().copied()
    }

    /// Returns true if the announcement uses the secp256k1 scheme.
    pub fn is_supported_scheme(&self) -> bool {
        self.scheme_id == SCHEME_ID_SECP256K1
    }

    /// Checks the structural fields.
    ///
    /// Curve validity of the ephemeral key is left to the scanner.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.is_empty() {
            return Err(ShadeError::InvalidAnnouncement(
                "metadata is empty (no view tag)".into(),
            ));
        }

        if self.ephemeral_public_key.len() != COMPRESSED_PUBLIC_KEY_SIZE {
            return Err(ShadeError::InvalidAnnouncement(format!(
                "ephemeral key size mismatch: expected {}, got {}",
                COMPRESSED_PUBLIC_KEY_SIZE,
                self.ephemeral_public_key.len()
            )));
        }

        if self.stealth_address.is_zero() {
            return Err(ShadeError::InvalidAnnouncement(
                "stealth address is the zero address".into(),
            ));
        }

        Ok(())
    }
}

/// Builder for announcements with optional fields.
#[derive(Default)]
pub struct AnnouncementBuilder {
    scheme_id: Option<u64>,
    stealth_address: Option<EthAddress>,
    caller: Option<EthAddress>,
    ephemeral_public_key: Option<Vec<u8>>,
    metadata: Option<Vec<u8>>,
    block_number: Option<u64>,
    tx_hash: Option<String>,
}

impl AnnouncementBuilder {
    /// Creates a new announcement builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scheme id (defaults to secp256k1).
    pub fn scheme_id(mut self, id: u64) -> Self {
        self.scheme_id = Some(id);
        self
    }

    /// Sets the stealth address (required).
    pub fn stealth_address(mut self, address: EthAddress) -> Self {
        self.stealth_address = Some(address);
        self
    }

    /// Sets the caller (defaults to the zero address).
    pub fn caller(mut self, caller: EthAddress) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Sets the ephemeral public key (required).
    pub fn ephemeral_public_key(mut self, key: Vec<u8>) -> Self {
        self.ephemeral_public_key = Some(key);
        self
    }

    /// Sets the metadata (required, first byte is the view tag).
    pub fn metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the block number.
    pub fn block_number(mut self, num: u64) -> Self {
        self.block_number = Some(num);
        self
    }

    /// Sets the transaction hash.
    pub fn tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.tx_hash = Some(hash.into());
        self
    }

    /// Builds and validates the announcement.
    pub fn build(self) -> Result<Announcement> {
        let stealth_address = self
            .stealth_address
            .ok_or_else(|| ShadeError::ValidationError("stealth_address is required".into()))?;

        let ephemeral_public_key = self.ephemeral_public_key.ok_or_else(|| {
            ShadeError::ValidationError("ephemeral_public_key is required".into())
        })?;

        let metadata = self
            .metadata
            .ok_or_else(|| ShadeError::ValidationError("metadata is required".into()))?;

        let mut announcement = Announcement::new(
            self.scheme_id.unwrap_or(SCHEME_ID_SECP256K1),
            stealth_address,
            self.caller.unwrap_or_default(),
            ephemeral_public_key,
            metadata,
        );
        announcement.block_number = self.block_number;
        announcement.tx_hash = self.tx_hash;

        announcement.validate()?;
        Ok(announcement)
    }
}

/// Statistics about announcements in a registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnouncementStats {
    /// Total number of announcements
    pub total_count: u64,
    /// Announcements per view tag (for distribution analysis)
    pub view_tag_distribution: Vec<u64>,
    /// Lowest block number seen
    pub earliest_block: Option<u64>,
    /// Highest block number seen
    pub latest_block: Option<u64>,
    /// Announcements with a scheme other than secp256k1
    pub foreign_scheme_count: u64,
}

impl Default for AnnouncementStats {
    fn default() -> Self {
        Self {
            total_count: 0,
            view_tag_distribution: vec![0; VIEW_TAG_SPACE],
            earliest_block: None,
            latest_block: None,
            foreign_scheme_count: 0,
        }
    }
}

impl AnnouncementStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates stats with a new announcement.
    pub fn add(&mut self, announcement: &Announcement) {
        self.total_count += 1;

        if let Some(tag) = announcement.view_tag() {
            self.view_tag_distribution[tag as usize] += 1;
        }

        if let Some(block) = announcement.block_number {
            self.earliest_block = Some(self.earliest_block.map_or(block, |b| b.min(block)));
            self.latest_block = Some(self.latest_block.map_or(block, |b| b.max(block)));
        }

        if !announcement.is_supported_scheme() {
            self.foreign_scheme_count += 1;
        }
    }
}
