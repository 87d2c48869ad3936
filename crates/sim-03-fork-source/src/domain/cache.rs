//! # Content-Addressed Fork Cache
//!
//! Remote responses for data at or below the pinned fork block never change,
//! so entries are write-once and never invalidated.
//!
//! ## Key
//!
//! `(chain id, fork block, sha256(method || 0x00 || json(args)))`
//!
//! ## Layout on disk
//!
//! ```text
//! <cache_dir>/<chain_id>/<fork_block>/<hex digest>.json
//! ```
//!
//! The memory layer is always on; the disk layer only when a directory is
//! configured and the data source allows persistence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::errors::ForkError;

/// Stable identity of a remote query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Remote chain id
    pub chain_id: u64,
    /// Pinned fork block
    pub fork_block_number: u64,
    /// Digest of method name and arguments
    pub digest: [u8; 32],
}

impl CacheKey {
    /// Builds the key for `method(args)` against a pinned fork.
    pub fn new(chain_id: u64, fork_block_number: u64, method: &str, args: &Value) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update([0u8]);
        hasher.update(args.to_string().as_bytes());
        Self {
            chain_id,
            fork_block_number,
            digest: hasher.finalize().into(),
        }
    }

    fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.chain_id.to_string())
            .join(self.fork_block_number.to_string())
            .join(format!("{}.json", hex::encode(self.digest)))
    }
}

/// Two-level (memory, optional disk) response cache.
#[derive(Debug, Default)]
pub struct ForkCache {
    memory: RwLock<HashMap<CacheKey, Value>>,
    disk_dir: Option<PathBuf>,
}

impl ForkCache {
    /// Memory-only cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache that also persists entries under `dir`.
    pub fn with_disk(dir: impl Into<PathBuf>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            disk_dir: Some(dir.into()),
        }
    }

    /// Directory backing the disk layer, if any.
    pub fn disk_dir(&self) -> Option<&Path> {
        self.disk_dir.as_deref()
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.memory.read().len()
    }

    /// Returns true if the memory layer is empty.
    pub fn is_empty(&self) -> bool {
        self.memory.read().is_empty()
    }

    /// Looks a key up in memory, then (if `use_disk`) on disk.
    ///
    /// Entries found on disk are promoted to memory.
    pub fn get(&self, key: &CacheKey, use_disk: bool) -> Option<Value> {
        if let Some(value) = self.memory.read().get(key) {
            return Some(value.clone());
        }

        if !use_disk {
            return None;
        }
        let path = self.disk_dir.as_ref()?.join(key.relative_path());
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                self.memory.write().entry(*key).or_insert_with(|| value.clone());
                debug!(path = %path.display(), "Fork cache entry loaded from disk");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt fork cache entry");
                None
            }
        }
    }

    /// Stores a response. Existing entries are left as they are.
    ///
    /// The memory layer is always updated; a disk failure is reported but
    /// the memory entry stays.
    pub fn insert(&self, key: CacheKey, value: Value, persist: bool) -> Result<(), ForkError> {
        let newly_inserted = {
            let mut memory = self.memory.write();
            if memory.contains_key(&key) {
                false
            } else {
                memory.insert(key, value.clone());
                true
            }
        };

        if !(persist && newly_inserted) {
            return Ok(());
        }
        let Some(dir) = &self.disk_dir else {
            return Ok(());
        };

        let path = dir.join(key.relative_path());
        if path.exists() {
            return Ok(());
        }
        write_atomically(&path, &value).map_err(|e| {
            ForkError::Cache(format!("failed to write {}: {}", path.display(), e))
        })
    }
}

fn write_atomically(path: &Path, value: &Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
