//! Workspace config files: config/config.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Environment selecting `config/{env}.toml`
pub const ENV_VAR: &str = "POSTSMITH_ENV";

/// Add workspace config files to builder.
/// Precedence: config/config.toml (base) then config/{POSTSMITH_ENV}.toml.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.is_file() {
        builder = builder.add_source(
            File::from(base_config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.is_file() {
        builder = builder.add_source(
            File::from(env_config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    Ok(builder)
}
