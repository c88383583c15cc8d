//! In-memory announcement registry.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use shade_core::error::{Result, ShadeError};
use shade_core::traits::AnnouncementRegistry;
use shade_core::types::{Announcement, AnnouncementStats};

/// In-memory announcement registry.
///
/// # Indexing
///
/// Announcements are indexed by:
/// - ID: For direct lookup and ordered paging
/// - View tag: For bucket queries
/// - Tx hash: For duplicate detection (when provided)
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// Primary storage: ID → Announcement
    announcements: DashMap<u64, Announcement>,
    /// Ordered id index for paging
    ids: RwLock<BTreeSet<u64>>,
    /// View tag index: tag → [announcement IDs]
    view_tag_index: DashMap<u8, Vec<u64>>,
    /// Tx hash index: normalized tx_hash → announcement ID
    tx_hash_index: DashMap<String, u64>,
    next_id: AtomicU64,
    stats: RwLock<AnnouncementStats>,
}

impl MemoryRegistry {
    /// Creates a new empty in-memory registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a registry with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            announcements: DashMap::with_capacity(capacity),
            ids: RwLock::new(BTreeSet::new()),
            view_tag_index: DashMap::with_capacity(256),
            tx_hash_index: DashMap::new(),
            next_id: AtomicU64::new(1),
            stats: RwLock::new(AnnouncementStats::new()),
        }
    }

    fn normalize_tx_hash(hash: &str) -> String {
        hash.trim().to_lowercase()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.stats.read().clone()
    }

    /// Clears all announcements.
    pub fn clear(&self) {
        self.announcements.clear();
        self.ids.write().clear();
        self.view_tag_index.clear();
        self.tx_hash_index.clear();
        self.next_id.store(1, Ordering::SeqCst);
        *self.stats.write() = AnnouncementStats::new();
    }

    /// Returns the number of announcements.
    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    /// Returns all announcements ordered by id.
    pub fn all_announcements(&self) -> Vec<Announcement> {
        let ids: Vec<u64> = self.ids.read().iter().copied().collect();
        self.collect_ids(&ids)
    }

    /// Imports announcements, keeping their ids when set.
    ///
    /// Announcements with id 0 get a fresh id; `u64::MAX` is rejected since no
    /// id could follow it. Stops at the first invalid or duplicate entry;
    /// everything before it stays imported.
    pub fn import(&self, announcements: Vec<Announcement>) -> Result<usize> {
        let mut imported = 0;

        for ann in announcements {
            ann.validate()?;

            if ann.id == u64::MAX {
                return Err(ShadeError::InvalidAnnouncement(format!(
                    "announcement id {} is out of range",
                    ann.id
                )));
            }
            if ann.id != 0 && self.announcements.contains_key(&ann.id) {
                return Err(ShadeError::DuplicateAnnouncement(format!(
                    "announcement id {} already exists",
                    ann.id
                )));
            }

            let fixed_id = (ann.id != 0).then_some(ann.id);
            self.insert(ann, fixed_id)?;
            imported += 1;
        }

        Ok(imported)
    }

    /// Indexes and stores a validated announcement.
    ///
    /// The tx-hash slot is claimed before an id is taken, so two concurrent
    /// publishes of the same transaction cannot both succeed.
    fn insert(&self, mut announcement: Announcement, fixed_id: Option<u64>) -> Result<u64> {
        let assign_id = || match fixed_id {
            Some(id) => {
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let id = match &announcement.tx_hash {
            Some(hash) => {
                let normalized = Self::normalize_tx_hash(hash);
                if normalized.is_empty() {
                    return Err(ShadeError::InvalidAnnouncement(
                        "tx_hash cannot be empty".into(),
                    ));
                }
                match self.tx_hash_index.entry(normalized) {
                    Entry::Occupied(existing) => {
                        return Err(ShadeError::DuplicateAnnouncement(format!(
                            "transaction {} already announced as id {}",
                            existing.key(),
                            existing.get()
                        )));
                    }
                    Entry::Vacant(slot) => {
                        let id = assign_id();
                        slot.insert(id);
                        id
                    }
                }
            }
            None => assign_id(),
        };
        announcement.id = id;

        if let Some(tag) = announcement.view_tag() {
            self.view_tag_index.entry(tag).or_default().push(id);
        }
        self.stats.write().add(&announcement);
        self.announcements.insert(id, announcement);
        self.ids.write().insert(id);

        Ok(id)
    }

    /// Removes an announcement and all of its index entries.
    ///
    /// The id is not handed out again.
    pub(crate) fn remove(&self, id: u64) -> Option<Announcement> {
        let (_, announcement) = self.announcements.remove(&id)?;
        self.ids.write().remove(&id);

        if let Some(tag) = announcement.view_tag() {
            if let Some(mut bucket) = self.view_tag_index.get_mut(&tag) {
                bucket.retain(|existing| *existing != id);
            }
        }
        if let Some(hash) = &announcement.tx_hash {
            self.tx_hash_index
                .remove_if(&Self::normalize_tx_hash(hash), |_, owner| *owner == id);
        }

        let mut stats = AnnouncementStats::new();
        for entry in self.announcements.iter() {
            stats.add(entry.value());
        }
        *self.stats.write() = stats;

        Some(announcement)
    }

    fn collect_ids(&self, ids: &[u64]) -> Vec<Announcement> {
        ids.iter()
            .filter_map(|id| self.announcements.get(id).map(|entry| entry.clone()))
            .collect()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnouncementRegistry for MemoryRegistry {
    /// Validates, assigns an id, indexes and stores the announcement.
    #[instrument(skip(self, announcement), fields(scheme_id = announcement.scheme_id))]
    async fn publish(&self, announcement: Announcement) -> Result<u64> {
        announcement.validate()?;
        let view_tag = announcement.view_tag();
        let id = self.insert(announcement, None)?;
        debug!(id, ?view_tag, "Published announcement");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_range(&self, from_id: u64, limit: usize) -> Result<Vec<Announcement>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ids: Vec<u64> = self
            .ids
            .read()
            .range(from_id..)
            .take(limit)
            .copied()
            .collect();

        Ok(self.collect_ids(&ids))
    }

    /// Bucket lookup; the bucket keeps publish order.
    #[instrument(skip(self))]
    async fn get_by_view_tag(&self, view_tag: u8) -> Result<Vec<Announcement>> {
        let ids = match self.view_tag_index.get(&view_tag) {
            Some(ids) => ids.clone(),
            None => return Ok(Vec::new()),
        };

        let announcements = self.collect_ids(&ids);
        debug!(view_tag, count = announcements.len(), "Retrieved by view tag");
        Ok(announcements)
    }

    #[instrument(skip(self))]
    async fn get_by_block_range(&self, from: u64, to: u64) -> Result<Vec<Announcement>> {
        let mut announcements: Vec<Announcement> = self
            .announcements
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .block_number
                    .is_some_and(|block| block >= from && block <= to)
            })
            .map(|entry| entry.value().clone())
            .collect();

        announcements.sort_by_key(|a| (a.block_number, a.id));

        debug!(from, to, count = announcements.len(), "Retrieved by block range");
        Ok(announcements)
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<Announcement>> {
        Ok(self.announcements.get(&id).map(|entry| entry.clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.announcements.len() as u64)
    }

    async fn next_id(&self) -> Result<u64> {
        Ok(self.next_id.load(Ordering::SeqCst))
    }
}
