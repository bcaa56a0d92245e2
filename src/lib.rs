//! Postsmith: quality-gated article generation from Markdown outlines
//!
//! Every level-3 heading of an outline document becomes one generated
//! article. Leaf items carry their two ancestor headings as a category,
//! generation attempts are cached by content address, each attempt passes a
//! mechanical quality gate with at most one repair, and accepted articles are
//! persisted once per (title, category).

pub mod cache;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod document;
pub mod error;
pub mod generation;
pub mod logging;
pub mod outline;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod quality;
pub mod store;
pub mod window;

pub use cache::{CacheKey, CacheRecord, CacheStore, FileCacheStore};
pub use config::{ConfigLoader, PostsmithConfig};
pub use document::Document;
pub use error::{PipelineError, StorageError};
pub use generation::{GenerationOrchestrator, ItemOutcome, ItemReport};
pub use outline::{extract_leaf_items, LeafItem};
pub use pipeline::{Pipeline, RunSummary};
pub use quality::{QualityGate, Verdict};
pub use store::{PostStore, SledPostStore};
