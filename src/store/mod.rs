//! Post Store
//!
//! Durable record of accepted articles. Posts are append-only, listed by
//! creation order or by category, and unique on (title, category).

pub mod persistence;

pub use persistence::SledPostStore;

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Monotonic sequence id (creation order)
    pub id: u64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Post store interface
pub trait PostStore: Send + Sync {
    fn exists(&self, title: &str, category: &str) -> Result<bool, StorageError>;

    /// Insert a post.
    ///
    /// Fails with [`StorageError::DuplicateKey`] when (title, category) is
    /// already present; the check and the insert are one atomic step.
    fn insert(&self, post: NewPost) -> Result<PostRecord, StorageError>;

    /// Most recent posts first.
    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>, StorageError>;

    /// Most recent posts of one category first.
    fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<PostRecord>, StorageError>;

    fn count(&self) -> Result<usize, StorageError>;
}
