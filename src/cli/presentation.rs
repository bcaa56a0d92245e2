//! CLI presentation: text and json formatters per command family.

mod outline;
mod posts;
mod run;

pub use outline::{format_leaf_items_json, format_leaf_items_text, format_verdict_text};
pub use posts::{format_models_json, format_models_text, format_posts_json, format_posts_text};
pub use run::{format_run_summary_json, format_run_summary_text};

use crate::error::PipelineError;

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        PipelineError::StorageError(crate::error::StorageError::Serialization(e.to_string()))
    })
}
