//! Enrichment Provider Port - Background research about a visitor.
//!
//! Given the visitor's identifiers, an enrichment provider returns what it
//! could learn about their company, themselves and their role. Calls are
//! slow and may fail; callers go through the in-flight coordinator so one
//! session never has two lookups running.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::SessionId;
use crate::domain::lead::ResearchSnapshot;

/// Identity to research.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    pub session_id: SessionId,
    pub email: String,
    pub name: Option<String>,
    pub company_url: Option<String>,
}

/// Research results. Missing parts are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default)]
    pub company: Option<Value>,
    #[serde(default)]
    pub person: Option<Value>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_confidence: Option<f64>,
}

impl Enrichment {
    /// Returns true when the provider found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.person.is_none()
            && self.role.is_none()
            && self.role_confidence.is_none()
    }
}

impl From<Enrichment> for ResearchSnapshot {
    fn from(enrichment: Enrichment) -> Self {
        ResearchSnapshot {
            company: enrichment.company,
            person: enrichment.person,
            role: enrichment.role,
            role_confidence: enrichment.role_confidence,
        }
    }
}

/// Enrichment failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("enrichment request failed: {0}")]
    Request(String),

    #[error("enrichment provider returned status {status}")]
    Status { status: u16 },

    #[error("enrichment response could not be parsed: {0}")]
    Parse(String),

    #[error("enrichment timed out after {0}s")]
    Timeout(u64),

    #[error("nothing found for {0}")]
    NoResults(String),
}

/// Port for visitor research.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn research(&self, request: EnrichmentRequest) -> Result<Enrichment, EnrichmentError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
