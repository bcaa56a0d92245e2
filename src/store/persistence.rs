//! Persistence layer for the Post Store

use crate::error::StorageError;
use crate::store::{NewPost, PostRecord, PostStore};
use bincode;
use blake3::Hasher;
use sled;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;

const POSTS_TREE: &str = "posts";
const KEYS_TREE: &str = "post_keys";
const CATEGORY_TREE: &str = "posts_by_category";

/// Sled-based implementation of PostStore
///
/// Trees:
/// - `posts`: big-endian sequence id -> bincode `PostRecord`
/// - `post_keys`: hash(title, category) -> sequence id (uniqueness)
/// - `posts_by_category`: `category \0 id` -> sequence id
pub struct SledPostStore {
    db: sled::Db,
    posts: sled::Tree,
    keys: sled::Tree,
    by_category: sled::Tree,
}

impl SledPostStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StorageError::Database(format!(
                "Failed to open post store at {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Self::from_db(db)
    }

    /// Throwaway store that is deleted on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            posts: db.open_tree(POSTS_TREE)?,
            keys: db.open_tree(KEYS_TREE)?,
            by_category: db.open_tree(CATEGORY_TREE)?,
            db,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn unique_key(title: &str, category: &str) -> [u8; 32] {
        let mut hasher = Hasher::new();
        for value in [title, category] {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    fn category_key(category: &str, id: u64) -> Vec<u8> {
        let mut key = Self::category_prefix(category);
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    fn category_prefix(category: &str) -> Vec<u8> {
        let mut prefix = category.as_bytes().to_vec();
        prefix.push(0);
        prefix
    }

    fn decode(value: &[u8]) -> Result<PostRecord, StorageError> {
        bincode::deserialize(value).map_err(|e| {
            StorageError::Serialization(format!("Failed to deserialize post record: {}", e))
        })
    }

    fn get_by_id(&self, id: &[u8]) -> Result<Option<PostRecord>, StorageError> {
        match self.posts.get(id)? {
            Some(value) => Self::decode(&value).map(Some),
            None => Ok(None),
        }
    }
}

impl PostStore for SledPostStore {
    fn exists(&self, title: &str, category: &str) -> Result<bool, StorageError> {
        Ok(self.keys.contains_key(Self::unique_key(title, category))?)
    }

    fn insert(&self, post: NewPost) -> Result<PostRecord, StorageError> {
        let id = self.db.generate_id()?;
        let record = PostRecord {
            id,
            title: post.title,
            content: post.content,
            category: post.category,
            created_at: post.created_at,
        };

        let value = bincode::serialize(&record).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize post record: {}", e))
        })?;
        let id_bytes = id.to_be_bytes();
        let unique = Self::unique_key(&record.title, &record.category);
        let category_key = Self::category_key(&record.category, id);

        // Uniqueness check and all three writes commit together or not at all.
        let outcome = (&self.posts, &self.keys, &self.by_category).transaction(
            |(posts, keys, by_category)| {
                if keys.get(&unique[..])?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        StorageError::DuplicateKey {
                            title: record.title.clone(),
                            category: record.category.clone(),
                        },
                    ));
                }
                keys.insert(&unique[..], &id_bytes[..])?;
                posts.insert(&id_bytes[..], value.as_slice())?;
                by_category.insert(category_key.as_slice(), &id_bytes[..])?;
                Ok(())
            },
        );

        match outcome {
            Ok(()) => Ok(record),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.posts.iter().rev().take(limit) {
            let (_, value) = item?;
            records.push(Self::decode(&value)?);
        }
        Ok(records)
    }

    fn list_by_category(&self, category: &str, limit: usize) -> Result<Vec<PostRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self
            .by_category
            .scan_prefix(Self::category_prefix(category))
            .rev()
            .take(limit)
        {
            let (_, id) = item?;
            if let Some(record) = self.get_by_id(&id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.posts.len())
    }
}
