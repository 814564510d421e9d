//! Shared state for HTTP handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::memory::{
    InMemoryCapabilityTracker, InMemoryContextStore, InMemoryLeadRepository,
};
use crate::application::handlers::capability::RecordCapabilityHandler;
use crate::application::handlers::chat::{StreamChatConfig, StreamChatHandler};
use crate::application::handlers::conversation::{GetLeadHandler, ProcessMessageHandler};
use crate::application::handlers::session::{
    EnrichmentOutcome, InitSessionHandler, DEFAULT_ENRICHMENT_WAIT,
};
use crate::application::in_flight::InFlightCoordinator;
use crate::application::session_locks::SessionLocks;
use crate::domain::lead::StageTransitionEngine;
use crate::ports::{AIProvider, CapabilityTracker, ContextStore, EnrichmentProvider, LeadRepository};

/// Handlers shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub init_session: Arc<InitSessionHandler>,
    pub process_message: Arc<ProcessMessageHandler>,
    pub get_lead: Arc<GetLeadHandler>,
    pub capabilities: Arc<RecordCapabilityHandler>,
    pub stream_chat: Arc<StreamChatHandler>,
    /// Kept so the server can drain pending research on shutdown.
    pub coordinator: InFlightCoordinator<EnrichmentOutcome>,
}

/// Tunables applied while wiring handlers.
#[derive(Debug, Clone)]
pub struct StateSettings {
    pub enrichment_wait: Duration,
    pub chat: StreamChatConfig,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            enrichment_wait: DEFAULT_ENRICHMENT_WAIT,
            chat: StreamChatConfig::default(),
        }
    }
}

/// Persistence ports behind the handlers.
#[derive(Clone)]
pub struct Stores {
    pub contexts: Arc<dyn ContextStore>,
    pub leads: Arc<dyn LeadRepository>,
    pub capabilities: Arc<dyn CapabilityTracker>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            contexts: Arc::new(InMemoryContextStore::new()),
            leads: Arc::new(InMemoryLeadRepository::new()),
            capabilities: Arc::new(InMemoryCapabilityTracker::new()),
        }
    }
}

impl AppState {
    /// Wires every handler over `stores`.
    ///
    /// The session orchestrator and the message processor share one set of
    /// session locks and one in-flight coordinator.
    pub fn new(
        stores: Stores,
        ai_provider: Arc<dyn AIProvider>,
        enrichment: Arc<dyn EnrichmentProvider>,
        settings: StateSettings,
    ) -> Self {
        let locks = SessionLocks::new();
        let coordinator = InFlightCoordinator::<EnrichmentOutcome>::new();

        let init_session = Arc::new(
            InitSessionHandler::new(
                stores.contexts.clone(),
                stores.leads.clone(),
                enrichment,
                coordinator.clone(),
                locks.clone(),
            )
            .with_wait_timeout(settings.enrichment_wait),
        );
        let process_message = Arc::new(
            ProcessMessageHandler::new(
                stores.leads.clone(),
                stores.contexts.clone(),
                StageTransitionEngine::default(),
                locks,
            )
            .with_research(init_session.clone()),
        );
        let capabilities = Arc::new(RecordCapabilityHandler::new(
            stores.capabilities,
            stores.contexts,
        ));
        let stream_chat = Arc::new(
            StreamChatHandler::new(ai_provider)
                .with_message_processing(process_message.clone())
                .with_capability_tracking(capabilities.clone())
                .with_config(settings.chat),
        );

        Self {
            init_session,
            process_message,
            get_lead: Arc::new(GetLeadHandler::new(stores.leads)),
            capabilities,
            stream_chat,
            coordinator,
        }
    }

    /// Wires handlers over fresh in-memory stores.
    pub fn in_memory(
        ai_provider: Arc<dyn AIProvider>,
        enrichment: Arc<dyn EnrichmentProvider>,
        settings: StateSettings,
    ) -> Self {
        Self::new(Stores::in_memory(), ai_provider, enrichment, settings)
    }
}
