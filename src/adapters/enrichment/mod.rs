//! Enrichment Provider Adapters.
//!
//! - `HttpEnrichmentProvider` - Research service over HTTP
//! - `MockEnrichmentProvider` - Deterministic research for tests and local runs

mod http_provider;
mod mock_provider;

pub use http_provider::{HttpEnrichmentConfig, HttpEnrichmentProvider};
pub use mock_provider::MockEnrichmentProvider;
