//! File-per-key cache storage
//!
//! Records are stored as pretty-printed JSON at
//! `{root}/{hex[0..2]}/{key}.json`. Writes go to a temporary file in the
//! same directory which is then renamed over the target, so a reader never
//! sees a half-written record.

use crate::cache::{CacheKey, CacheRecord, CacheStore, CACHE_SCHEMA_VERSION};
use crate::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache store backed by one JSON file per key
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    /// Open (and create if needed) a cache rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create cache directory at {:?}: {}", root, e),
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `key`.
    pub fn record_path(&self, key: &CacheKey) -> PathBuf {
        let hex = key.to_hex();
        self.root.join(&hex[0..2]).join(format!("{}.json", hex))
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.record_path(key).is_file()
    }

    fn decode(key: &CacheKey, bytes: &[u8]) -> Result<CacheRecord, StorageError> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse cache record {}: {}", key, e))
        })?;

        let version = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if version != CACHE_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchema {
                found: version,
                expected: CACHE_SCHEMA_VERSION,
            });
        }

        let record: CacheRecord = serde_json::from_value(value).map_err(|e| {
            StorageError::Serialization(format!("Invalid cache record {}: {}", key, e))
        })?;

        if record.key() != *key {
            return Err(StorageError::KeyMismatch {
                key: key.to_hex(),
                found: format!("[{}] {}", record.category, record.title),
            });
        }
        Ok(record)
    }
}

impl CacheStore for FileCacheStore {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CacheRecord>, StorageError> {
        let path = self.record_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to read cache record {:?}: {}", path, e),
                )))
            }
        };
        Self::decode(key, &bytes).map(Some)
    }

    fn write(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), StorageError> {
        let path = self.record_path(key);
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create cache directory {:?}: {}", parent, e),
            ))
        })?;

        let serialized = serde_json::to_vec_pretty(record).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize cache record: {}", e))
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;

        // Atomic replace; the temp file is removed if persisting fails.
        temp.persist(&path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.error.kind(),
                format!("Failed to move cache record into {:?}: {}", path, e.error),
            ))
        })?;
        Ok(())
    }
}
