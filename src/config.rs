//! Engine configuration
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `CONTEXT_ADVISOR__<SECTION>__<KEY>` environment variables (a `.env`
//!    file is honoured)

use crate::context::ContextManagerConfig;
use crate::error::Result;
use crate::logging::LoggingConfig;
use crate::performance::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "CONTEXT_ADVISOR";

/// Top-level configuration for both engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub context: ContextManagerConfig,

    #[serde(default)]
    pub performance: MonitorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load from an optional TOML file layered under the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load from flat environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CONTEXT_ADVISOR_MAX_TOKENS") {
            if let Ok(num) = val.parse() {
                config.context.max_tokens = num;
            }
        }

        if let Ok(val) = std::env::var("CONTEXT_ADVISOR_RESERVED_TOKENS") {
            if let Ok(num) = val.parse() {
                config.context.reserved_tokens = num;
            }
        }

        if let Ok(val) = std::env::var("CONTEXT_ADVISOR_CACHE_SIZE") {
            if let Ok(num) = val.parse() {
                config.context.cache_size = num;
            }
        }

        if let Ok(val) = std::env::var("PERF_BASELINE_PATH") {
            config.performance.baseline_path = val.into();
        }

        if let Ok(val) = std::env::var("PERF_PERSIST") {
            config.performance.persist = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            config.logging.level = val;
        }

        if let Ok(val) = std::env::var("LOG_JSON") {
            config.logging.json = val.to_lowercase() == "true" || val == "1";
        }

        config
    }
}
