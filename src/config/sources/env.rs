//! Environment overrides: `POSTSMITH__SECTION__KEY`, e.g.
//! `POSTSMITH__GENERATOR__MODEL=mistral` or `POSTSMITH__RUN__LIMIT=5`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("POSTSMITH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
