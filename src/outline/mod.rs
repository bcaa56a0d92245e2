//! Outline extraction
//!
//! A single forward pass over the document body that tracks the active
//! level-1 and level-2 headings and emits one [`LeafItem`] per level-3
//! heading, in document order.

pub mod title;

pub use title::normalize_title;

use serde::{Deserialize, Serialize};

/// Label used when a leaf has no enclosing level-1 heading
pub const NO_SECTION_LABEL: &str = "No main section";
/// Label used when a leaf has no enclosing level-2 heading
pub const NO_SUBSECTION_LABEL: &str = "No subsection";
/// Separator between the parts of a category
pub const CATEGORY_SEPARATOR: &str = ", ";

/// A parsed heading line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    pub level: usize,
    pub text: &'a str,
}

/// Parse a heading line of level 1 to 3.
///
/// Leading whitespace is allowed; the marker must be followed by whitespace
/// and non-empty text. Deeper markers (`####`) are not headings here.
pub fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let trimmed = line.trim_start();
    let level = trimmed.bytes().take_while(|b| *b == b'#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some(Heading { level, text })
}

/// Non-fatal irregularities found while extracting a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionAnomaly {
    /// No level-1 heading precedes the leaf; the placeholder label was used
    MissingSection,
    /// No level-2 heading in the current level-1 scope; the placeholder label was used
    MissingSubsection,
}

/// The currently active ancestor headings
#[derive(Debug, Clone, Default)]
pub struct HeadingScope {
    h1: String,
    h2: String,
}

impl HeadingScope {
    pub fn enter_section(&mut self, text: &str) {
        self.h1 = text.to_string();
        self.h2.clear();
    }

    pub fn enter_subsection(&mut self, text: &str) {
        self.h2 = text.to_string();
    }

    /// Effective ancestor labels, with placeholders for missing levels.
    pub fn ancestors(&self) -> (String, String) {
        let (h1, h2, _) = self.labels();
        (h1, h2)
    }

    /// Effective labels plus the anomalies recorded for placeholder use.
    fn labels(&self) -> (String, String, Vec<ExtractionAnomaly>) {
        let mut anomalies = Vec::new();
        let h1 = if self.h1.is_empty() {
            anomalies.push(ExtractionAnomaly::MissingSection);
            NO_SECTION_LABEL.to_string()
        } else {
            self.h1.clone()
        };
        let h2 = if self.h2.is_empty() {
            anomalies.push(ExtractionAnomaly::MissingSubsection);
            NO_SUBSECTION_LABEL.to_string()
        } else {
            self.h2.clone()
        };
        (h1, h2, anomalies)
    }
}

/// One unit of generation: a level-3 heading and its ancestry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafItem {
    pub source_id: String,
    pub h1: String,
    pub h2: String,
    /// Leaf heading text as written in the document
    pub raw_heading: String,
    /// Leaf heading with ordinal/label prefixes stripped
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub anomalies: Vec<ExtractionAnomaly>,
}

/// Compose the category of a leaf from its source and ancestor labels.
pub fn compose_category(source_id: &str, h1: &str, h2: &str) -> String {
    [source_id, h1, h2].join(CATEGORY_SEPARATOR)
}

/// Extract the leaf items of a document body, in document order.
pub fn extract_leaf_items(source_id: &str, body: &str) -> Vec<LeafItem> {
    let mut scope = HeadingScope::default();
    let mut items = Vec::new();

    for line in body.lines() {
        let Some(heading) = parse_heading(line) else {
            continue;
        };
        match heading.level {
            1 => scope.enter_section(heading.text),
            2 => scope.enter_subsection(heading.text),
            _ => {
                let (h1, h2, anomalies) = scope.labels();
                items.push(LeafItem {
                    source_id: source_id.to_string(),
                    category: compose_category(source_id, &h1, &h2),
                    title: normalize_title(heading.text),
                    raw_heading: heading.text.to_string(),
                    h1,
                    h2,
                    anomalies,
                });
            }
        }
    }

    items
}
