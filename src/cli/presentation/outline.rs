//! Outline and quality-check presentation.

use super::to_json;
use crate::error::PipelineError;
use crate::outline::LeafItem;
use crate::quality::Verdict;
use comfy_table::Table;

pub fn format_leaf_items_text(source_id: &str, items: &[LeafItem]) -> String {
    if items.is_empty() {
        return format!("{}: no ### headings found.", source_id);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Title", "Category", "Heading"]);
    for (i, item) in items.iter().enumerate() {
        let mut title = item.title.clone();
        if !item.anomalies.is_empty() {
            title.push_str(" *");
        }
        table.add_row(vec![
            (i + 1).to_string(),
            title,
            item.category.clone(),
            item.raw_heading.clone(),
        ]);
    }
    let mut out = format!("{}: {} leaf item(s)\n{}", source_id, items.len(), table);
    if items.iter().any(|item| !item.anomalies.is_empty()) {
        out.push_str("\n* placeholder section labels used");
    }
    out
}

pub fn format_leaf_items_json(items: &[LeafItem]) -> Result<String, PipelineError> {
    to_json(items)
}

pub fn format_verdict_text(verdict: &Verdict, words: usize) -> String {
    let status = if verdict.accepted { "ACCEPTED" } else { "REJECTED" };
    format!("{}: {} (~{} words)", status, verdict.reason, words)
}
