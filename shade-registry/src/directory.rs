//! In-memory meta-address directory.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use shade_core::error::{Result, ShadeError};
use shade_core::traits::MetaAddressRegistry;
use shade_core::types::MetaAddress;

/// Identifier → meta-address map.
///
/// Identifiers are trimmed and lowercased, so `"0xABC"` and `" 0xabc "`
/// name the same entry. Registering again replaces the previous value.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: DashMap<String, MetaAddress>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(identifier: &str) -> Result<String> {
        let key = identifier.trim().to_lowercase();
        if key.is_empty() {
            return Err(ShadeError::ValidationError("identifier cannot be empty".into()));
        }
        Ok(key)
    }
}

#[async_trait]
impl MetaAddressRegistry for MemoryDirectory {
    #[instrument(skip(self, meta_address))]
    async fn register(&self, identifier: &str, meta_address: MetaAddress) -> Result<()> {
        let key = Self::normalize(identifier)?;
        debug!(identifier = %key, "Registered meta-address");
        self.entries.insert(key, meta_address);
        Ok(())
    }

    async fn lookup(&self, identifier: &str) -> Result<MetaAddress> {
        let key = Self::normalize(identifier)?;
        self.entries
            .get(&key)
            .map(|entry| *entry.value())
            .ok_or_else(|| ShadeError::NotFound(format!("no meta-address registered for {key}")))
    }

    async fn is_registered(&self, identifier: &str) -> Result<bool> {
        Ok(self.entries.contains_key(&Self::normalize(identifier)?))
    }
}
