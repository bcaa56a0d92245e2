//! Source documents
//!
//! Loads Markdown outline documents, detaches the optional front-matter block
//! and derives the source identity used in categories and cache keys.

use crate::error::{PipelineError, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A loaded outline document
#[derive(Debug, Clone)]
pub struct Document {
    /// Source identity (file stem, or file name when the stem is empty)
    pub source_id: String,
    /// Path the document was read from, if any
    pub path: Option<PathBuf>,
    /// Detached front-matter metadata
    pub metadata: BTreeMap<String, String>,
    /// Body text with normalized newlines and front matter removed
    pub body: String,
}

impl Document {
    /// Build a document from raw text.
    pub fn parse(source_id: impl Into<String>, raw: &str) -> Self {
        let (metadata, body) = split_front_matter(raw);
        Self {
            source_id: source_id.into(),
            path: None,
            metadata,
            body,
        }
    }

    /// Read a document from disk. Invalid UTF-8 is replaced, not rejected.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let bytes = fs::read(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read document {:?}: {}", path, e),
            ))
        })?;
        let raw = String::from_utf8_lossy(&bytes);
        let mut document = Self::parse(source_identity(path), &raw);
        document.path = Some(path.to_path_buf());
        Ok(document)
    }
}

/// Source identity for a document path.
pub fn source_identity(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default();
    if stem.is_empty() {
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        stem
    }
}

pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split a leading `---` delimited metadata block from the body.
///
/// Only `key: value` lines are kept; surrounding quotes are stripped and
/// `#` lines are ignored. A document without a closing delimiter has no
/// front matter.
pub fn split_front_matter(raw: &str) -> (BTreeMap<String, String>, String) {
    let text = normalize_newlines(raw);
    let mut metadata = BTreeMap::new();

    let Some(rest) = text.strip_prefix("---\n") else {
        return (metadata, text);
    };
    let Some(end) = rest.find("\n---\n") else {
        return (metadata, text);
    };

    for line in rest[..end].lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        metadata.insert(key.to_string(), value.to_string());
    }

    let body = rest[end + "\n---\n".len()..].to_string();
    (metadata, body)
}

/// List the Markdown documents directly inside `dir`, sorted by path.
///
/// A missing directory or an empty one is a configuration fault.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::SourceNotFound(dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            PipelineError::StorageError(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to read source directory {:?}: {}", dir, e),
            )))
        })?;
        let path = entry.path();
        let is_markdown = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_markdown {
            sources.push(path.to_path_buf());
        }
    }

    if sources.is_empty() {
        return Err(PipelineError::NoSourceDocuments(dir.to_path_buf()));
    }
    sources.sort();
    Ok(sources)
}
