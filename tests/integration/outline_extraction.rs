//! Document loading, leaf extraction and context windows together

use super::test_utils::{TestWorkspace, INTRO_OUTLINE};
use postsmith::document::Document;
use postsmith::outline::{extract_leaf_items, ExtractionAnomaly};
use postsmith::window::{window_for, TRUNCATION_MARKER};

#[test]
fn test_loaded_document_yields_categorized_leaves() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_document("intro.md", INTRO_OUTLINE);

    let document = Document::load(&path).unwrap();
    assert_eq!(document.source_id, "intro");
    assert_eq!(document.metadata.get("title").map(String::as_str), Some("Intro course"));
    assert!(!document.body.contains("title:"));

    let items = extract_leaf_items(&document.source_id, &document.body);
    let summary: Vec<(&str, &str)> = items
        .iter()
        .map(|item| (item.title.as_str(), item.category.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Weights", "intro, Fundamentals, Basics"),
            ("Biases", "intro, Fundamentals, Basics"),
            ("Loss functions", "intro, Fundamentals, Training"),
        ]
    );
    assert!(items.iter().all(|item| item.anomalies.is_empty()));
}

#[test]
fn test_windows_follow_document_blocks() {
    let document = Document::parse("intro", INTRO_OUTLINE);
    let items = extract_leaf_items(&document.source_id, &document.body);

    let weights = window_for(&document.body, &items[0], 12_000);
    assert_eq!(
        weights,
        "# Fundamentals\n## Basics\n### 1. Weights\nWeights scale inputs."
    );

    let loss = window_for(&document.body, &items[2], 12_000);
    assert!(loss.starts_with("# Fundamentals\n## Training\n### Lesson 3: Loss functions"));
    assert!(loss.ends_with("Loss measures error."));
    assert!(!loss.contains("Biases"));
}

#[test]
fn test_crlf_document_matches_lf_document() {
    let crlf = INTRO_OUTLINE.replace('\n', "\r\n");
    let from_crlf = Document::parse("intro", &crlf);
    let from_lf = Document::parse("intro", INTRO_OUTLINE);

    assert_eq!(from_crlf.body, from_lf.body);
    assert_eq!(from_crlf.metadata, from_lf.metadata);
    assert_eq!(
        extract_leaf_items("intro", &from_crlf.body),
        extract_leaf_items("intro", &from_lf.body)
    );
}

#[test]
fn test_headings_inside_long_document() {
    let mut body = String::from("Preamble without headings.\n# Part\n");
    for unit in 1..=3 {
        body.push_str(&format!("## Unit {}\n", unit));
        for lesson in 1..=4 {
            body.push_str(&format!("### {}.{} — Lesson body {}\n", unit, lesson, lesson));
            body.push_str(&"filler words here ".repeat(100));
            body.push('\n');
            body.push_str("#### Not a leaf\n");
        }
    }

    let items = extract_leaf_items("course", &body);
    assert_eq!(items.len(), 12);
    assert_eq!(items[0].title, "Lesson body 1");
    assert_eq!(items[11].category, "course, Part, Unit 3");

    let window = window_for(&body, &items[5], 300);
    assert!(window.starts_with("# Part\n## Unit 2\n### 2.2 — Lesson body 2"));
    assert!(window.ends_with(TRUNCATION_MARKER));
    // Level-4 headings stay inside the block.
    let full = window_for(&body, &items[5], 100_000);
    assert!(full.ends_with("#### Not a leaf"));
}

#[test]
fn test_front_matter_only_document() {
    let document = Document::parse("empty", "---\ntitle: Nothing\n---\n");
    assert_eq!(document.body, "");
    assert!(extract_leaf_items("empty", &document.body).is_empty());
}

#[test]
fn test_h2_before_any_h1_is_recorded() {
    let items = extract_leaf_items("doc", "## Early\n### Leaf\n# Main\n## Late\n### Other\n");
    assert_eq!(items[0].category, "doc, No main section, Early");
    assert_eq!(items[0].anomalies, vec![ExtractionAnomaly::MissingSection]);
    assert_eq!(items[1].category, "doc, Main, Late");
}
