//! Run summary presentation.

use super::to_json;
use crate::error::PipelineError;
use crate::pipeline::RunSummary;
use comfy_table::Table;

pub fn format_run_summary_text(summary: &RunSummary, dry_run: bool) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Counter", "Value"]);
    let rows: [(&str, usize); 14] = [
        ("Documents", summary.documents),
        ("Documents without ### headings", summary.documents_without_leaves),
        ("Unreadable documents", summary.document_errors),
        ("Leaf items", summary.leaf_items),
        ("Extraction anomalies", summary.anomalies),
        ("Cache hits", summary.cache_hits),
        ("Generated", summary.generated),
        ("Repair calls", summary.repair_calls),
        ("Persisted", summary.persisted),
        ("Skipped (duplicate)", summary.skipped_duplicate),
        ("Rejected", summary.rejected),
        ("Generation failures", summary.generation_failures),
        ("Store failures", summary.persist_failures),
        ("Deferred (limit)", summary.deferred),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }

    let mut out = String::new();
    if dry_run {
        out.push_str("Dry run: nothing was written to the post store.\n");
    }
    out.push_str(&table.to_string());
    out.push_str(&format!("\nFinished in {:.1}s", summary.elapsed_ms as f64 / 1000.0));
    out
}

pub fn format_run_summary_json(summary: &RunSummary, dry_run: bool) -> Result<String, PipelineError> {
    to_json(&serde_json::json!({
        "dry_run": dry_run,
        "summary": summary,
    }))
}
