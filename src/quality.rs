//! Quality gate
//!
//! Deterministic acceptance rules for generated articles. Rules run in a
//! fixed order and stop at the first failure:
//!
//! 1. the text opens with a level-1 heading
//! 2. the approximate word count reaches the minimum
//! 3. every required section marker is present (case-insensitive)
//! 4. no trimmed, non-blank line repeats too often
//!
//! Evaluation is pure; cached content is re-checked against the current gate
//! on every run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_MIN_WORDS: usize = 200;
pub const DEFAULT_REPETITION_THRESHOLD: usize = 6;
pub const DEFAULT_REQUIRED_SECTIONS: &[&str] = &["**Meta:**", "Pitfalls", "Checklist", "Next steps"];

pub const REASON_OK: &str = "OK";
pub const REASON_MISSING_TITLE: &str = "missing title heading";
pub const REASON_REPETITION: &str = "excessive repetition";

/// Why a text was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    MissingTitle,
    TooShort { words: usize },
    MissingSections(Vec<String>),
    ExcessiveRepetition { line: String, count: usize },
}

impl Rejection {
    /// Length and missing-section failures can be fixed by a repair pass.
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            Rejection::TooShort { .. } | Rejection::MissingSections(_)
        )
    }

    pub fn reason(&self) -> String {
        match self {
            Rejection::MissingTitle => REASON_MISSING_TITLE.to_string(),
            Rejection::TooShort { words } => format!("too short (~{} words)", words),
            Rejection::MissingSections(missing) => {
                format!("missing sections: {}", missing.join(", "))
            }
            Rejection::ExcessiveRepetition { .. } => REASON_REPETITION.to_string(),
        }
    }
}

/// Gate verdict for one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: String,
    pub rejection: Option<Rejection>,
}

impl Verdict {
    fn accept() -> Self {
        Self {
            accepted: true,
            reason: REASON_OK.to_string(),
            rejection: None,
        }
    }

    fn reject(rejection: Rejection) -> Self {
        Self {
            accepted: false,
            reason: rejection.reason(),
            rejection: Some(rejection),
        }
    }

    pub fn is_repairable(&self) -> bool {
        self.rejection
            .as_ref()
            .map(Rejection::is_repairable)
            .unwrap_or(false)
    }
}

/// Configured gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    pub min_words: usize,
    pub required_sections: Vec<String>,
    pub repetition_threshold: usize,
    /// Also require the level-1 heading to match the expected title
    pub require_title_match: bool,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::with_min_words(DEFAULT_MIN_WORDS)
    }
}

impl QualityGate {
    pub fn with_min_words(min_words: usize) -> Self {
        Self {
            min_words,
            required_sections: DEFAULT_REQUIRED_SECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            repetition_threshold: DEFAULT_REPETITION_THRESHOLD,
            require_title_match: false,
        }
    }

    /// Evaluate without an expected title.
    pub fn evaluate(&self, text: &str) -> Verdict {
        self.evaluate_titled(text, None)
    }

    /// Evaluate, checking the opening heading against `expected_title` when
    /// `require_title_match` is set.
    pub fn evaluate_titled(&self, text: &str, expected_title: Option<&str>) -> Verdict {
        let text = text.trim();

        let heading = text
            .lines()
            .next()
            .and_then(|first| first.strip_prefix("# "))
            .map(str::trim)
            .filter(|h| !h.is_empty());
        let Some(heading) = heading else {
            return Verdict::reject(Rejection::MissingTitle);
        };
        if self.require_title_match {
            if let Some(expected) = expected_title {
                if heading.to_lowercase() != expected.trim().to_lowercase() {
                    return Verdict::reject(Rejection::MissingTitle);
                }
            }
        }

        let words = word_count(text);
        if words < self.min_words {
            return Verdict::reject(Rejection::TooShort { words });
        }

        let lowered = text.to_lowercase();
        let missing: Vec<String> = self
            .required_sections
            .iter()
            .filter(|marker| !lowered.contains(&marker.to_lowercase()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Verdict::reject(Rejection::MissingSections(missing));
        }

        if let Some((line, count)) = most_repeated_line(text) {
            if count >= self.repetition_threshold {
                return Verdict::reject(Rejection::ExcessiveRepetition {
                    line: line.to_string(),
                    count,
                });
            }
        }

        Verdict::accept()
    }
}

/// Evaluate `text` with the default markers and threshold.
pub fn evaluate(text: &str, min_words: usize) -> Verdict {
    QualityGate::with_min_words(min_words).evaluate(text)
}

/// Approximate word count: runs of alphanumeric or underscore characters.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .count()
}

fn most_repeated_line(text: &str) -> Option<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        *counts.entry(line).or_insert(0) += 1;
    }
    counts.into_iter().max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
}
