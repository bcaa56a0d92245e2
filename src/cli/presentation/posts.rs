//! Post listing and provider model presentation.

use super::to_json;
use crate::error::PipelineError;
use crate::store::PostRecord;
use comfy_table::Table;
use serde_json::json;

pub fn format_posts_text(posts: &[PostRecord]) -> String {
    if posts.is_empty() {
        return "No posts found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["ID", "Created", "Title", "Category", "Words"]);
    for post in posts {
        table.add_row(vec![
            post.id.to_string(),
            post.created_at.format("%Y-%m-%d %H:%M").to_string(),
            post.title.clone(),
            post.category.clone(),
            crate::quality::word_count(&post.content).to_string(),
        ]);
    }
    format!("{}\nTotal: {} post(s)", table, posts.len())
}

pub fn format_posts_json(posts: &[PostRecord]) -> Result<String, PipelineError> {
    to_json(posts)
}

pub fn format_models_text(provider: &str, models: &[String]) -> String {
    if models.is_empty() {
        return format!("Provider '{}' reported no models.", provider);
    }
    let mut out = format!("Models available from {}:\n", provider);
    for model in models {
        out.push_str(&format!("  {}\n", model));
    }
    out.push_str(&format!("\nTotal: {} model(s)", models.len()));
    out
}

pub fn format_models_json(provider: &str, models: &[String]) -> Result<String, PipelineError> {
    to_json(&json!({ "provider": provider, "models": models, "total": models.len() }))
}
