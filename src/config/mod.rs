//! # Configuration Management
//!
//! Configuration is resolved once by the caller and handed to every entry point;
//! checkers never read process-wide state.

mod settings;

pub use settings::{AnalyzerConfig, AppConfig, ObservabilityConfig, MESH_WIDE_HOST};

use crate::errors::Result;
use std::path::Path;

impl AppConfig {
    /// Layer defaults, an optional YAML/TOML file and `MESHLINT__*` environment
    /// variables (e.g. `MESHLINT__ANALYZER__AUTO_MTLS_ENABLED=false`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix("MESHLINT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
