//! HTTP Enrichment Provider.
//!
//! Posts the visitor's identifiers to a research service and maps its JSON
//! reply onto [`Enrichment`].
//!
//! Endpoint: `POST {base_url}/research` with a bearer token, body
//! `{sessionId, email, name?, companyUrl?}`, reply
//! `{company?, person?, role?, roleConfidence?}`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::ports::{Enrichment, EnrichmentError, EnrichmentProvider, EnrichmentRequest};

/// Configuration for the HTTP enrichment provider.
#[derive(Debug, Clone)]
pub struct HttpEnrichmentConfig {
    /// Base URL of the research service.
    pub base_url: String,
    api_key: Option<SecretString>,
    pub timeout: Duration,
}

impl HttpEnrichmentConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Research service client.
pub struct HttpEnrichmentProvider {
    config: HttpEnrichmentConfig,
    client: Client,
}

impl HttpEnrichmentProvider {
    pub fn new(config: HttpEnrichmentConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnrichmentError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn research_url(&self) -> String {
        format!("{}/research", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &EnrichmentRequest) -> Result<Response, EnrichmentError> {
        let mut builder = self
            .client
            .post(self.research_url())
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EnrichmentError::Timeout(self.config.timeout.as_secs())
            } else if e.is_connect() {
                EnrichmentError::Request(format!("Connection failed: {}", e))
            } else {
                EnrichmentError::Request(e.to_string())
            }
        })
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    async fn research(&self, request: EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        let response = self.send(&request).await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EnrichmentError::NoResults(request.email));
        }
        if !status.is_success() {
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
            });
        }

        let enrichment: Enrichment = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))?;

        if enrichment.is_empty() {
            return Err(EnrichmentError::NoResults(request.email));
        }
        Ok(enrichment)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
