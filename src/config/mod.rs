//! Runtime configuration.
//!
//! Loaded from the environment through `config` and `dotenvy`. Every section
//! has defaults; `validate` runs before the server binds.
//!
//! # Example
//!
//! ```no_run
//! use leadflow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod enrichment;
mod error;
mod server;

pub use ai::AiConfig;
pub use enrichment::EnrichmentConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// All configuration sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat generation parameters
    #[serde(default)]
    pub ai: AiConfig,

    /// Background research service
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and `LEADFLOW__<SECTION>__<KEY>` variables,
    /// e.g. `LEADFLOW__SERVER__PORT=8080` or `LEADFLOW__ENRICHMENT__BASE_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("LEADFLOW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.enrichment.validate(&self.server.environment)?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
