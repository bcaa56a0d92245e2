//! Context windowing
//!
//! Builds the bounded slice of source text that belongs to one leaf: the
//! reconstructed heading trail followed by the body lines up to the next
//! heading of level 1 to 3.

use crate::outline::{parse_heading, HeadingScope, LeafItem};

/// Default character budget for a context window
pub const DEFAULT_MAX_CHARS: usize = 12_000;
/// Appended when a window is cut at the budget
pub const TRUNCATION_MARKER: &str = "\n\n*(Context truncated at size limit)*\n";

/// Heading trail that opens every window.
pub fn heading_trail(h1: &str, h2: &str, raw_heading: &str) -> String {
    format!("# {}\n## {}\n### {}\n", h1, h2, raw_heading)
}

/// Extract the context window for a leaf heading.
///
/// The block starts after the level-3 heading whose text equals
/// `raw_heading` and whose enclosing level-1/level-2 headings are `h1` and
/// `h2` (placeholder labels included), and stops before the next level 1-3
/// heading. When no heading matches under those ancestors, the first
/// level-3 heading with that text is used. A heading that cannot be found
/// at all yields the trail alone.
pub fn context_window(
    body: &str,
    h1: &str,
    h2: &str,
    raw_heading: &str,
    max_chars: usize,
) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let wanted = raw_heading.trim();
    let mut scope = HeadingScope::default();
    let mut first_match = None;
    let mut scoped_match = None;

    for (index, line) in lines.iter().enumerate() {
        let Some(heading) = parse_heading(line) else {
            continue;
        };
        match heading.level {
            1 => scope.enter_section(heading.text),
            2 => scope.enter_subsection(heading.text),
            _ if heading.text == wanted => {
                first_match.get_or_insert(index);
                let (scope_h1, scope_h2) = scope.ancestors();
                if scope_h1 == h1 && scope_h2 == h2 {
                    scoped_match = Some(index);
                    break;
                }
            }
            _ => {}
        }
    }

    let trail = heading_trail(h1, h2, raw_heading);
    let chunk = match scoped_match.or(first_match) {
        Some(start) => {
            let block: Vec<&str> = lines[start + 1..]
                .iter()
                .take_while(|line| parse_heading(line).is_none())
                .copied()
                .collect();
            format!("{}{}", trail, block.join("\n")).trim().to_string()
        }
        None => trail.trim().to_string(),
    };

    // The trail is never cut, even when the budget is smaller than it.
    let floor = trail.trim_end().chars().count();
    truncate(chunk, max_chars.max(floor))
}

/// Context window for an extracted leaf item.
pub fn window_for(body: &str, item: &LeafItem, max_chars: usize) -> String {
    context_window(body, &item.h1, &item.h2, &item.raw_heading, max_chars)
}

fn truncate(chunk: String, max_chars: usize) -> String {
    match chunk.char_indices().nth(max_chars) {
        None => chunk,
        Some((cut, _)) => {
            let mut out = chunk[..cut].trim_end().to_string();
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}
