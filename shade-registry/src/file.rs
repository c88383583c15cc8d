//! File-based announcement registry with persistence.
//!
//! Keeps a [`MemoryRegistry`] in front of a single file and writes it back
//! on demand or after a configurable number of publishes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use shade_core::error::{Result, ShadeError};
use shade_core::traits::AnnouncementRegistry;
use shade_core::types::{Announcement, AnnouncementStats};

use crate::MemoryRegistry;

/// File format magic bytes
const MAGIC: &[u8; 4] = b"SHAD";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + count
const HEADER_LEN: usize = 13;
/// Default number of publishes between automatic saves
const DEFAULT_AUTO_SAVE_THRESHOLD: u64 = 100;

/// File-based announcement registry.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "SHAD"
/// version (1 byte): 1
/// count (8 bytes, little endian): number of announcements
/// body: JSON array of announcements, ordered by id
/// ```
pub struct FileRegistry {
    path: PathBuf,
    memory: MemoryRegistry,
    dirty: AtomicBool,
    auto_save_threshold: u64,
    writes_since_save: AtomicU64,
}

impl FileRegistry {
    /// Opens the registry at `path`, loading it if the file exists.
    ///
    /// A missing file is an empty registry; the file is created on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let registry = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryRegistry::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: DEFAULT_AUTO_SAVE_THRESHOLD,
            writes_since_save: AtomicU64::new(0),
        };

        if fs::try_exists(&registry.path).await? {
            registry.load().await?;
        }

        Ok(registry)
    }

    /// Opens the registry and saves automatically every `threshold` publishes.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        if threshold == 0 {
            return Err(ShadeError::ConfigError(
                "auto-save threshold must be at least 1".into(),
            ));
        }
        let mut registry = Self::new(path).await?;
        registry.auto_save_threshold = threshold;
        Ok(registry)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await?;
        let announcements = decode_file(&contents)?;

        info!(count = announcements.len(), "Loading announcements from file");
        self.memory.import(announcements)?;
        self.dirty.store(false, Ordering::SeqCst);

        Ok(())
    }

    /// Writes all announcements to disk.
    ///
    /// The file is written to a sibling temp file and renamed over the target.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let announcements = self.memory.all_announcements();
        let contents = encode_file(&announcements)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        debug!(count = announcements.len(), "Registry saved");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Saves if there are unsaved changes.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory registry.
    pub fn memory(&self) -> &MemoryRegistry {
        &self.memory
    }

    /// Returns statistics.
    pub fn stats(&self) -> AnnouncementStats {
        self.memory.stats()
    }

    /// Returns the number of announcements.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn maybe_auto_save(&self) -> Result<()> {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst) + 1;
        if writes >= self.auto_save_threshold {
            self.save().await?;
        }
        Ok(())
    }
}

fn encode_file(announcements: &[Announcement]) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(announcements)?;

    let mut contents = Vec::with_capacity(HEADER_LEN + body.len());
    contents.extend_from_slice(MAGIC);
    contents.push(VERSION);
    contents.extend_from_slice(&(announcements.len() as u64).to_le_bytes());
    contents.extend_from_slice(&body);
    Ok(contents)
}

fn decode_file(contents: &[u8]) -> Result<Vec<Announcement>> {
    if contents.len() < HEADER_LEN {
        return Err(ShadeError::RegistryError("file too short".into()));
    }
    if &contents[0..4] != MAGIC {
        return Err(ShadeError::RegistryError("invalid magic bytes".into()));
    }
    if contents[4] != VERSION {
        return Err(ShadeError::VersionMismatch {
            expected: VERSION,
            actual: contents[4],
        });
    }

    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
    let count = u64::from_le_bytes(count_bytes);

    let announcements: Vec<Announcement> = if contents.len() == HEADER_LEN {
        Vec::new()
    } else {
        serde_json::from_slice(&contents[HEADER_LEN..])?
    };

    if announcements.len() as u64 != count {
        return Err(ShadeError::RegistryError(format!(
            "header says {} announcements, body has {}",
            count,
            announcements.len()
        )));
    }

    Ok(announcements)
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        if self.is_dirty() {
            warn!(path = ?self.path, "FileRegistry dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl AnnouncementRegistry for FileRegistry {
    /// Stores the announcement and runs the auto-save check.
    ///
    /// If that save fails the announcement is removed again, so an `Err`
    /// never leaves a record behind and the publish can be retried.
    async fn publish(&self, announcement: Announcement) -> Result<u64> {
        let id = self.memory.publish(announcement).await?;
        self.dirty.store(true, Ordering::SeqCst);
        if let Err(e) = self.maybe_auto_save().await {
            warn!(id, error = %e, "Auto-save failed, rolling back publish");
            self.memory.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    async fn get_range(&self, from_id: u64, limit: usize) -> Result<Vec<Announcement>> {
        self.memory.get_range(from_id, limit).await
    }

    async fn get_by_view_tag(&self, view_tag: u8) -> Result<Vec<Announcement>> {
        self.memory.get_by_view_tag(view_tag).await
    }

    async fn get_by_block_range(&self, from: u64, to: u64) -> Result<Vec<Announcement>> {
        self.memory.get_by_block_range(from, to).await
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<Announcement>> {
        self.memory.get_by_id(id).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }

    async fn next_id(&self) -> Result<u64> {
        self.memory.next_id().await
    }
}
