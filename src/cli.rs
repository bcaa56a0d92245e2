//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error, CommandOutput};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_leaf_items_json, format_leaf_items_text, format_models_json, format_models_text,
    format_posts_json, format_posts_text, format_run_summary_json, format_run_summary_text,
    format_verdict_text,
};
pub use route::RunContext;
