//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Invalid enrichment base URL: {0}")]
    InvalidEnrichmentUrl(String),

    #[error("Enrichment base URL must use HTTPS in production")]
    EnrichmentUrlMustBeHttps,

    #[error("Invalid enrichment timeout")]
    InvalidEnrichmentTimeout,
}
