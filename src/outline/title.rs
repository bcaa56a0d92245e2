//! Leaf title normalization
//!
//! Ordinal and label prefixes ("Lesson 3.2.1 —", "Unit 4:", "2.1)") are
//! stripped by an ordered list of declarative rules. Rules run in sequence;
//! each one sees the output of the previous rule.

use regex::Regex;
use std::sync::LazyLock;

/// A single prefix-stripping rule
pub struct TitleRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
    /// Replace every match instead of only the first one
    pub global: bool,
}

impl TitleRule {
    pub fn apply(&self, input: &str) -> String {
        if self.global {
            self.pattern.replace_all(input, self.replacement).into_owned()
        } else {
            self.pattern.replace(input, self.replacement).into_owned()
        }
    }
}

const RULE_SPECS: &[(&str, &str, &str, bool)] = &[
    (
        "label",
        r"(?i)^(?:lecci[oó]n|lesson|tema|topic|cap[ií]tulo|chapter|unidad|unit|module|m[oó]dulo|part|parte)\.?\s*(\d)",
        "$1",
        false,
    ),
    (
        "ordinal",
        r"^\s*\d+(?:[.\-]\d+){0,6}\s*[).\-–—:]*\s*",
        "",
        false,
    ),
    ("leading_dash", r"^\s*[–—-]\s*", "", false),
    ("collapse_whitespace", r"\s{2,}", " ", true),
];

/// The ordered prefix rules. Patterns are literals; a pattern that fails to
/// compile is dropped, which the rule-count test catches.
pub static TITLE_RULES: LazyLock<Vec<TitleRule>> = LazyLock::new(|| {
    RULE_SPECS
        .iter()
        .filter_map(|(name, pattern, replacement, global)| {
            Regex::new(pattern).ok().map(|pattern| TitleRule {
                name,
                pattern,
                replacement,
                global: *global,
            })
        })
        .collect()
});

/// Strip ordinal/label prefixes from a raw leaf heading.
///
/// Falls back to the trimmed raw heading when stripping leaves nothing.
pub fn normalize_title(raw: &str) -> String {
    let original = raw.trim();
    let stripped = TITLE_RULES
        .iter()
        .fold(original.to_string(), |acc, rule| rule.apply(&acc));
    let stripped = stripped.trim();
    if stripped.is_empty() {
        original.to_string()
    } else {
        stripped.to_string()
    }
}
