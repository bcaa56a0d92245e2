//! Merge rules: built-in defaults sit under every other source, later sources
//! override earlier ones key by key.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("workspace.source_dir", "documents")?
        .set_default("workspace.cache_dir", ".postsmith/cache")?
        .set_default("workspace.store_path", ".postsmith/posts.db")
}
