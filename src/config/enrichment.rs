//! Enrichment (background research) configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::enrichment::HttpEnrichmentConfig;

/// Research service configuration.
///
/// Without a `base_url` the binary falls back to the mock provider.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Base URL of the research service
    pub base_url: Option<String>,

    /// Bearer token for the research service
    pub api_key: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long session init waits for research before answering
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// HTTP provider settings, when a research service is configured.
    pub fn http_config(&self) -> Option<HttpEnrichmentConfig> {
        let base_url = self.base_url.as_deref()?.trim();
        if base_url.is_empty() {
            return None;
        }
        let mut config = HttpEnrichmentConfig::new(base_url).with_timeout(self.timeout());
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        Some(config)
    }

    /// Validate enrichment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.wait_timeout_secs == 0 {
            return Err(ValidationError::InvalidEnrichmentTimeout);
        }
        if let Some(url) = self.base_url.as_deref().map(str::trim) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidEnrichmentUrl(url.to_string()));
            }
            if *environment == Environment::Production && !url.starts_with("https://") {
                return Err(ValidationError::EnrichmentUrlMustBeHttps);
            }
        }
        Ok(())
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_wait_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_mock_provider() {
        let config = EnrichmentConfig::default();
        assert!(config.http_config().is_none());
        assert_eq!(config.wait_timeout(), Duration::from_secs(10));
        assert!(config.validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_http_config_from_base_url() {
        let config = EnrichmentConfig {
            base_url: Some("https://research.example.com".to_string()),
            timeout_secs: 5,
            ..Default::default()
        };
        let http = config.http_config().unwrap();
        assert_eq!(http.base_url, "https://research.example.com");
        assert_eq!(http.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = EnrichmentConfig {
            base_url: Some("research.example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidEnrichmentUrl(_))
        ));
    }

    #[test]
    fn test_production_requires_https() {
        let config = EnrichmentConfig {
            base_url: Some("http://research.internal".to_string()),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::EnrichmentUrlMustBeHttps)
        );
    }

    #[test]
    fn test_zero_timeouts_are_invalid() {
        let config = EnrichmentConfig {
            wait_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidEnrichmentTimeout)
        );
    }
}
