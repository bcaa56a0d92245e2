//! Config loader: builds a [`PostsmithConfig`] from the layered sources.

use super::merge::builder_with_defaults;
use super::sources::{env, global_file, workspace_file};
use super::PostsmithConfig;
use crate::error::PipelineError;
use config::{File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global config file,
    /// `config/config.toml`, `config/{POSTSMITH_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<PostsmithConfig, PipelineError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);

        let config: PostsmithConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from one explicit file (plus defaults and
    /// environment).
    pub fn load_from_file(path: &Path) -> Result<PostsmithConfig, PipelineError> {
        if !path.is_file() {
            return Err(PipelineError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = env::add_to_builder(builder);

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Path of the user-level config file.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
