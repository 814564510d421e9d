//! Mock Enrichment Provider.
//!
//! Deterministic research derived from the email domain, with call
//! counting, simulated latency and failure injection.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::lead::company_from_email;
use crate::ports::{Enrichment, EnrichmentError, EnrichmentProvider, EnrichmentRequest};

#[derive(Debug, Clone, Default)]
pub struct MockEnrichmentProvider {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<EnrichmentRequest>>>,
    delay: Duration,
    fail: Arc<AtomicBool>,
    fixed: Option<Enrichment>,
}

impl MockEnrichmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always return this enrichment.
    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.fixed = Some(enrichment);
        self
    }

    /// Makes subsequent calls fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get_requests(&self) -> Vec<EnrichmentRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn derive(request: &EnrichmentRequest) -> Enrichment {
        let company = company_from_email(&request.email);
        Enrichment {
            company: company.as_ref().map(|name| {
                json!({
                    "name": name,
                    "domain": request.email.rsplit_once('@').map(|(_, d)| d),
                    "employeeCount": 120,
                    "techAdoption": 0.6,
                })
            }),
            person: request.name.as_ref().map(|name| json!({ "name": name })),
            role: Some("Operations".to_string()),
            role_confidence: Some(if company.is_some() { 0.6 } else { 0.3 }),
        }
    }
}

#[async_trait]
impl EnrichmentProvider for MockEnrichmentProvider {
    async fn research(&self, request: EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(EnrichmentError::Status { status: 503 });
        }

        Ok(self.fixed.clone().unwrap_or_else(|| Self::derive(&request)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
