//! Property-based tests for title normalization and context windows

use postsmith::outline::{extract_leaf_items, normalize_title};
use postsmith::window::{context_window, heading_trail, TRUNCATION_MARKER};
use proptest::prelude::*;

/// Normalized titles are never empty and never carry an ordinal prefix
#[test]
fn test_normalize_title_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("(Lesson |Unit |Tema )?[0-9]{1,2}(\\.[0-9]{1,2}){0,3}", "[ )\\.:—-]{1,3}", "[A-Za-z][a-z ]{0,20}"),
            |(prefix, separator, topic)| {
                let raw = format!("{}{}{}", prefix, separator, topic);
                let title = normalize_title(&raw);
                assert!(!title.is_empty());
                assert!(!title.starts_with(|c: char| c.is_ascii_digit()));
                assert!(!title.contains("  "));
                Ok(())
            },
        )
        .unwrap();
}

/// Normalizing twice changes nothing for plain titles
#[test]
fn test_normalize_title_idempotent_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[A-Za-z][A-Za-z ]{0,30}", |raw| {
            let once = normalize_title(&raw);
            assert_eq!(normalize_title(&once), once);
            assert!(!once.is_empty());
            Ok(())
        })
        .unwrap();
}

/// Every level-3 line becomes exactly one leaf
#[test]
fn test_leaf_count_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(0usize..5, 0..40), |levels| {
            let mut body = String::new();
            for (i, level) in levels.iter().enumerate() {
                match level {
                    0 => body.push_str(&format!("plain line {}\n", i)),
                    4 => body.push_str(&format!("#### deep {}\n", i)),
                    n => body.push_str(&format!("{} Heading {}\n", "#".repeat(*n), i)),
                }
            }
            let expected = levels.iter().filter(|l| **l == 3).count();
            let items = extract_leaf_items("doc", &body);
            assert_eq!(items.len(), expected);
            assert!(items.iter().all(|item| item.category.starts_with("doc, ")));
            Ok(())
        })
        .unwrap();
}

/// A truncated window always keeps the full heading trail
#[test]
fn test_window_keeps_trail_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[a-zé ]{0,500}", 1usize..200), |(text, max_chars)| {
            let body = format!("# A\n## B\n### Leaf\n{}\n", text);
            let window = context_window(&body, "A", "B", "Leaf", max_chars);
            let trail = heading_trail("A", "B", "Leaf");
            assert!(window.starts_with(trail.trim_end()));

            let limit = max_chars.max(trail.trim_end().chars().count());
            if window.ends_with(TRUNCATION_MARKER) {
                let kept = window.len() - TRUNCATION_MARKER.len();
                assert!(window[..kept].chars().count() <= limit);
            } else {
                assert!(window.chars().count() <= limit);
            }
            Ok(())
        })
        .unwrap();
}
