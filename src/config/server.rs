//! HTTP listener settings.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Where and how the API listens.
///
/// Every field has a default, so an empty `server` section is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Applies to JSON endpoints. Chat streams are exempt.
    pub request_timeout_secs: u64,
    /// Comma-separated list of browser origins allowed by CORS.
    pub cors_origins: Option<String>,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,leadflow=debug,tower_http=info".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ValidationError::InvalidAddress(raw))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured origins with blanks dropped.
    pub fn cors_origins_list(&self) -> Vec<String> {
        let Some(raw) = &self.cors_origins else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod defaults {
        use super::*;

        #[test]
        fn listens_on_all_interfaces_in_development() {
            let config = ServerConfig::default();
            assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
            assert_eq!(config.environment, Environment::Development);
            assert!(!config.is_production());
            assert_eq!(config.request_timeout(), Duration::from_secs(30));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn no_cors_origins_by_default() {
            assert!(ServerConfig::default().cors_origins_list().is_empty());
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn port_zero_is_rejected() {
            let config = ServerConfig {
                port: 0,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
        }

        #[test]
        fn timeout_must_be_within_bounds() {
            for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
                let config = ServerConfig {
                    request_timeout_secs: secs,
                    ..Default::default()
                };
                assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
            }
        }

        #[test]
        fn unparseable_host_is_rejected() {
            let config = ServerConfig {
                host: "not a host".to_string(),
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::InvalidAddress("not a host:8080".to_string()))
            );
        }
    }

    #[test]
    fn cors_origins_are_trimmed_and_blanks_dropped() {
        let config = ServerConfig {
            cors_origins: Some(" https://acme.io, ,https://www.acme.io,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.cors_origins_list(),
            vec!["https://acme.io", "https://www.acme.io"]
        );
    }
}
