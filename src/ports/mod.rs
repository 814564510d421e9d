//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `ContextStore` - Conversation contexts (identifiers and research)
//! - `LeadRepository` - Stage and lead data per session
//! - `CapabilityTracker` - Capabilities shown to a visitor
//!
//! ## Collaborator Ports
//!
//! - `EnrichmentProvider` - Background research about a visitor
//! - `AIProvider` - Streamed text generation for chat turns

mod ai_provider;
mod capability_tracker;
mod context_store;
mod enrichment_provider;
mod lead_repository;

pub use ai_provider::{
    AIError, AIProvider, GenerationRequest, GenerationStream, GenerationUnit, Message,
    MessageRole, ProviderInfo,
};
pub use capability_tracker::{CapabilityRecord, CapabilityTracker};
pub use context_store::{ContextStore, StoreError};
pub use enrichment_provider::{Enrichment, EnrichmentError, EnrichmentProvider, EnrichmentRequest};
pub use lead_repository::LeadRepository;
