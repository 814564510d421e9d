//! ProcessMessageHandler - Advances a session's stage for one inbound message.
//!
//! Every read-modify-write of stage, lead data and context for a session
//! happens under that session's lock. Research triggered by the message runs
//! in the background through the session orchestrator.

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::session::InitSessionHandler;
use crate::application::session_locks::SessionLocks;
use crate::domain::foundation::{SessionId, ValidationError};
use crate::domain::lead::{
    CompanySize, ContextPatch, IndustrySignals, LeadData, LeadRecord, Stage,
    StageTransitionEngine, TransitionTriggers,
};
use crate::ports::{ContextStore, LeadRepository, StoreError};

/// Command to process one visitor message.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub session_id: SessionId,
    pub content: String,
}

impl ProcessMessageCommand {
    pub fn new(session_id: SessionId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
        }
    }
}

/// Outcome of processing a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMessageResult {
    pub session_id: SessionId,
    pub previous_stage: Stage,
    pub stage: Stage,
    /// Stages entered by this message, in order.
    pub path: Vec<Stage>,
    pub triggers: TransitionTriggers,
    pub lead: LeadData,
    pub message_count: u32,
}

/// Errors from message processing.
#[derive(Debug, thiserror::Error)]
pub enum ProcessMessageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Handler for inbound visitor messages.
pub struct ProcessMessageHandler {
    leads: Arc<dyn LeadRepository>,
    contexts: Arc<dyn ContextStore>,
    engine: StageTransitionEngine,
    locks: SessionLocks,
    research: Option<Arc<InitSessionHandler>>,
}

impl ProcessMessageHandler {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        contexts: Arc<dyn ContextStore>,
        engine: StageTransitionEngine,
        locks: SessionLocks,
    ) -> Self {
        Self {
            leads,
            contexts,
            engine,
            locks,
            research: None,
        }
    }

    /// Enables background research when a message crosses into
    /// BACKGROUND_RESEARCH.
    pub fn with_research(mut self, research: Arc<InitSessionHandler>) -> Self {
        self.research = Some(research);
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessMessageCommand,
    ) -> Result<ProcessMessageResult, ProcessMessageError> {
        let content = cmd.content.trim();
        if content.is_empty() {
            return Err(ValidationError::empty_field("content").into());
        }
        let session_id = cmd.session_id;

        let result = {
            let _guard = self.locks.acquire(&session_id).await;

            let mut record = self
                .leads
                .find(&session_id)
                .await?
                .unwrap_or_else(|| LeadRecord::new(session_id.clone()));
            let context = self.contexts.get(&session_id).await?;

            // 1. Stage transition
            let (transition, signals) = self.engine.evaluate(record.stage, content);
            debug_assert!(transition.next_stage.ordinal() >= record.stage.ordinal());

            // 2. Lead data
            record.lead.absorb(&signals);
            let research = context.as_ref().and_then(|c| c.company_context.as_ref());
            if record.lead.company.is_none() {
                record.lead.company = research
                    .and_then(|company| company.get("name"))
                    .and_then(|name| name.as_str())
                    .map(str::to_string);
            }
            let extractor = self.engine.extractor();
            let industry = research
                .map(IndustrySignals::from_company_context)
                .unwrap_or_default()
                .merge(extractor.industry_signals(content));
            let company_size = research
                .map(CompanySize::from_company_context)
                .unwrap_or_default();
            record
                .lead
                .refresh_scores(extractor.as_ref(), &industry, company_size);

            record.stage = transition.next_stage;
            record.message_count += 1;
            if transition.triggers.should_send_follow_up {
                record.follow_up_requested = true;
            }
            record.touch();

            // 3. Context, then the record. A failed context write leaves the
            // stored stage where it was, so a retry is judged from it.
            let mut patch = ContextPatch::default().with_last_user_message(content);
            if let Some(email) = &signals.email {
                patch.email = Some(email.clone());
            }
            if signals.name.is_some() && context.as_ref().and_then(|c| c.name.as_ref()).is_none() {
                patch.name = record.lead.name.clone();
            }
            self.contexts.store(&session_id, patch).await?;
            self.leads.save(&record).await?;

            if transition.changed() {
                tracing::info!(
                    session_id = %session_id,
                    from = %transition.previous_stage,
                    to = %transition.next_stage,
                    "Stage advanced"
                );
            }

            ProcessMessageResult {
                session_id: session_id.clone(),
                previous_stage: transition.previous_stage,
                stage: transition.next_stage,
                path: transition.path,
                triggers: transition.triggers,
                lead: record.lead,
                message_count: record.message_count,
            }
        };

        // 4. Side effects, outside the lock
        if result.triggers.should_trigger_research {
            self.spawn_research(session_id.clone());
        }
        if result.triggers.should_send_follow_up {
            tracing::info!(
                session_id = %session_id,
                lead_score = result.lead.lead_score,
                "Follow-up requested"
            );
        }

        Ok(result)
    }

    fn spawn_research(&self, session_id: SessionId) {
        let Some(research) = self.research.clone() else {
            tracing::debug!(session_id = %session_id, "Research not configured");
            return;
        };
        tokio::spawn(async move {
            match research.ensure_enrichment(&session_id).await {
                Ok(result) => tracing::debug!(
                    session_id = %session_id,
                    context_ready = result.context_ready,
                    "Background research finished"
                ),
                Err(err) => tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "Background research failed"
                ),
            }
        });
    }
}
