//! Generation cache
//!
//! Content-addressed records of completed generation attempts, keyed by
//! (source identity, leaf title, category, generator identity). Accepted and
//! rejected attempts are both kept so a later run can see them without a new
//! generation call; the orchestrator always re-validates cached content.

pub mod storage;

pub use storage::FileCacheStore;

use crate::error::StorageError;
use crate::outline::LeafItem;
use blake3::Hasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current on-disk record shape
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Deterministic cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derive the key for an item and generator.
    ///
    /// Each field is length-prefixed before hashing, so separators inside
    /// titles or categories cannot make two different tuples collide.
    pub fn derive(source_id: &str, title: &str, category: &str, generator: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"postsmith-cache:v1");
        for (tag, value) in [
            (&b"source:"[..], source_id),
            (&b"title:"[..], title),
            (&b"category:"[..], category),
            (&b"generator:"[..], generator),
        ] {
            hasher.update(tag);
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn for_item(item: &LeafItem, generator: &str) -> Self {
        Self::derive(&item.source_id, &item.title, &item.category, generator)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Ancestor headings of the leaf a record was generated for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingTrail {
    pub h1: String,
    pub h2: String,
    pub h3_raw: String,
}

/// A cached generation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub schema_version: u32,
    pub source_id: String,
    pub title: String,
    pub category: String,
    pub generator: String,
    pub created_at: DateTime<Utc>,
    pub accepted: bool,
    pub reason: String,
    #[serde(default)]
    pub repaired: bool,
    pub trail: HeadingTrail,
    pub content: String,
}

impl CacheRecord {
    pub fn new(
        item: &LeafItem,
        generator: &str,
        content: String,
        accepted: bool,
        reason: String,
        repaired: bool,
    ) -> Self {
        Self {
            schema_version: CACHE_SCHEMA_VERSION,
            source_id: item.source_id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            generator: generator.to_string(),
            created_at: Utc::now(),
            accepted,
            reason,
            repaired,
            trail: HeadingTrail {
                h1: item.h1.clone(),
                h2: item.h2.clone(),
                h3_raw: item.raw_heading.clone(),
            },
            content,
        }
    }

    /// Key recomputed from the record's own fields.
    pub fn key(&self) -> CacheKey {
        CacheKey::derive(&self.source_id, &self.title, &self.category, &self.generator)
    }
}

/// Keyed store of generation attempts
///
/// `write` is the only mutator and must be atomic: a concurrent `lookup`
/// sees either the previous record or the new one, never a partial write.
pub trait CacheStore: Send + Sync {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CacheRecord>, StorageError>;
    fn write(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), StorageError>;
}
