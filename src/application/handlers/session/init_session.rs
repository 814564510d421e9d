//! InitSessionHandler - Idempotent session initialization with background research.
//!
//! Initializing a session records the visitor's identifiers and makes sure
//! research about them exists. Repeating the call never repeats research
//! that already succeeded, and concurrent calls for the same session share
//! one research request.

use std::sync::Arc;
use std::time::Duration;

use crate::application::in_flight::{InFlightCoordinator, InFlightError};
use crate::application::session_locks::SessionLocks;
use crate::domain::foundation::{SessionId, ValidationError};
use crate::domain::lead::{ContextPatch, ConversationContext, ResearchSnapshot};
use crate::ports::{
    ContextStore, EnrichmentProvider, EnrichmentRequest, LeadRepository, StoreError,
};

/// Default time a caller waits for research before answering without it.
pub const DEFAULT_ENRICHMENT_WAIT: Duration = Duration::from_secs(10);

/// Command to initialize (or re-initialize) a session.
#[derive(Debug, Clone, Default)]
pub struct InitSessionCommand {
    /// Explicit session id from the request body.
    pub session_id: Option<String>,
    /// `x-session-id` request header.
    pub header_session_id: Option<String>,
    /// `idempotency-key` request header.
    pub idempotency_key: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub company_url: Option<String>,
}

/// Result of session initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct InitSessionResult {
    pub session_id: SessionId,
    /// True when research is available for the session.
    pub context_ready: bool,
    pub snapshot: Option<ResearchSnapshot>,
}

/// How a research attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// Research was persisted; the snapshot reflects the stored context.
    Enriched(ResearchSnapshot),
    Failed { reason: String },
}

/// Errors that fail initialization.
#[derive(Debug, thiserror::Error)]
pub enum InitSessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("context store failure: {0}")]
    Store(#[from] StoreError),
}

/// Picks the session id: body field, then `x-session-id`, then
/// `idempotency-key`, then a fresh id. Blank values count as absent.
pub fn resolve_session_id(
    explicit: Option<&str>,
    header_session_id: Option<&str>,
    idempotency_key: Option<&str>,
) -> Result<SessionId, ValidationError> {
    [explicit, header_session_id, idempotency_key]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
        .map(SessionId::parse)
        .unwrap_or_else(|| Ok(SessionId::new()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated identity of the visitor.
struct Identity {
    email: String,
    name: Option<String>,
    company_url: Option<String>,
}

impl Identity {
    fn from_command(cmd: &InitSessionCommand) -> Result<Self, ValidationError> {
        let email = non_blank(cmd.email.clone())
            .ok_or_else(|| ValidationError::empty_field("email"))?
            .to_lowercase();
        if !email.contains('@') {
            return Err(ValidationError::invalid_format("email", "missing @ symbol"));
        }
        Ok(Self {
            email,
            name: non_blank(cmd.name.clone()),
            company_url: non_blank(cmd.company_url.clone()),
        })
    }
}

/// Session orchestrator.
pub struct InitSessionHandler {
    contexts: Arc<dyn ContextStore>,
    leads: Arc<dyn LeadRepository>,
    enrichment: Arc<dyn EnrichmentProvider>,
    coordinator: InFlightCoordinator<EnrichmentOutcome>,
    locks: SessionLocks,
    wait_timeout: Duration,
}

impl InitSessionHandler {
    pub fn new(
        contexts: Arc<dyn ContextStore>,
        leads: Arc<dyn LeadRepository>,
        enrichment: Arc<dyn EnrichmentProvider>,
        coordinator: InFlightCoordinator<EnrichmentOutcome>,
        locks: SessionLocks,
    ) -> Self {
        Self {
            contexts,
            leads,
            enrichment,
            coordinator,
            locks,
            wait_timeout: DEFAULT_ENRICHMENT_WAIT,
        }
    }

    /// Sets how long a caller waits for research.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: InitSessionCommand,
    ) -> Result<InitSessionResult, InitSessionError> {
        // 1. Validate and resolve the session id
        let identity = Identity::from_command(&cmd)?;
        let session_id = resolve_session_id(
            cmd.session_id.as_deref(),
            cmd.header_session_id.as_deref(),
            cmd.idempotency_key.as_deref(),
        )?;

        // 2. Best-effort identity record
        if let Err(err) = self
            .leads
            .upsert_identity(&session_id, &identity.email, identity.name.as_deref())
            .await
        {
            tracing::warn!(session_id = %session_id, error = %err, "Failed to record lead identity");
        }

        // 3-6. Reconcile the stored context under the session lock
        let context = {
            let _guard = self.locks.acquire(&session_id).await;
            match self.contexts.get(&session_id).await? {
                None => {
                    let patch = ContextPatch::identity(
                        identity.email.clone(),
                        identity.name.clone(),
                        identity.company_url.clone(),
                    );
                    self.contexts.store(&session_id, patch).await?
                }
                Some(existing) => {
                    let context = match existing.identity_changes(
                        &identity.email,
                        identity.name.as_deref(),
                        identity.company_url.as_deref(),
                    ) {
                        Some(patch) => {
                            tracing::debug!(session_id = %session_id, "Updating changed identifiers");
                            self.contexts.update(&session_id, patch).await?
                        }
                        None => existing,
                    };

                    if let Some(snapshot) = context.research_snapshot() {
                        tracing::info!(session_id = %session_id, "Session already researched");
                        return Ok(InitSessionResult {
                            session_id,
                            context_ready: true,
                            snapshot: Some(snapshot),
                        });
                    }
                    context
                }
            }
        };

        // 7-8. Research outside the lock
        Ok(self.enrich(&context).await)
    }

    /// Runs research for a stored session unless it already has some.
    ///
    /// Sessions without a stored email are left alone.
    pub async fn ensure_enrichment(
        &self,
        session_id: &SessionId,
    ) -> Result<InitSessionResult, InitSessionError> {
        let context = {
            let _guard = self.locks.acquire(session_id).await;
            self.contexts.get(session_id).await?
        };

        let Some(context) = context else {
            tracing::debug!(session_id = %session_id, "No context to enrich");
            return Ok(InitSessionResult {
                session_id: session_id.clone(),
                context_ready: false,
                snapshot: None,
            });
        };

        if let Some(snapshot) = context.research_snapshot() {
            return Ok(InitSessionResult {
                session_id: session_id.clone(),
                context_ready: true,
                snapshot: Some(snapshot),
            });
        }

        Ok(self.enrich(&context).await)
    }

    async fn enrich(&self, context: &ConversationContext) -> InitSessionResult {
        let session_id = context.session_id.clone();
        let not_ready = InitSessionResult {
            session_id: session_id.clone(),
            context_ready: false,
            snapshot: None,
        };

        let Some(email) = context.email.clone() else {
            tracing::debug!(session_id = %session_id, "No email to research");
            return not_ready;
        };

        let request = EnrichmentRequest {
            session_id: session_id.clone(),
            email,
            name: context.name.clone(),
            company_url: context.company_url.clone(),
        };
        let provider = Arc::clone(&self.enrichment);
        let contexts = Arc::clone(&self.contexts);
        let locks = self.locks.clone();

        let outcome = self
            .coordinator
            .submit_with_timeout(session_id.as_str(), self.wait_timeout, move || {
                run_enrichment(provider, contexts, locks, request)
            })
            .await;

        match outcome {
            Ok(EnrichmentOutcome::Enriched(snapshot)) => InitSessionResult {
                session_id,
                context_ready: true,
                snapshot: Some(snapshot),
            },
            Ok(EnrichmentOutcome::Failed { reason }) => {
                tracing::warn!(session_id = %session_id, reason = %reason, "Enrichment failed");
                not_ready
            }
            Err(InFlightError::TimedOut { after, .. }) => {
                tracing::warn!(
                    session_id = %session_id,
                    waited_ms = after.as_millis() as u64,
                    "Enrichment still running, answering without it"
                );
                not_ready
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "Enrichment did not complete");
                not_ready
            }
        }
    }
}

/// The coordinated unit of work: research, then persist.
///
/// Persisting here means research lands in the store even when every
/// waiting caller has given up.
async fn run_enrichment(
    provider: Arc<dyn EnrichmentProvider>,
    contexts: Arc<dyn ContextStore>,
    locks: SessionLocks,
    request: EnrichmentRequest,
) -> EnrichmentOutcome {
    let session_id = request.session_id.clone();
    tracing::info!(session_id = %session_id, provider = provider.name(), "Starting enrichment");

    let enrichment = match provider.research(request).await {
        Ok(enrichment) => enrichment,
        Err(err) => {
            return EnrichmentOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };

    let _guard = locks.acquire(&session_id).await;
    match contexts
        .update(&session_id, ContextPatch::research(enrichment.into()))
        .await
    {
        Ok(context) => match context.research_snapshot() {
            Some(snapshot) => {
                tracing::info!(session_id = %session_id, "Enrichment stored");
                EnrichmentOutcome::Enriched(snapshot)
            }
            None => EnrichmentOutcome::Failed {
                reason: "provider returned no research".to_string(),
            },
        },
        Err(err) => EnrichmentOutcome::Failed {
            reason: format!("failed to persist research: {}", err),
        },
    }
}
