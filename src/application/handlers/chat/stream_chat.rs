//! StreamChatHandler - Turns one chat request into an ordered chunk stream.
//!
//! Every generation unit becomes a [`ChatChunk`] with a sequential `seq`
//! under a single message id. The stream always ends with exactly one
//! terminal chunk: `done`, or `error` when generation fails part way.
//!
//! Chunks are pumped by a spawned task through a bounded channel. Dropping
//! the returned stream (client went away) stops the pump at its next send.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::application::handlers::capability::{RecordCapabilityCommand, RecordCapabilityHandler};
use crate::application::handlers::conversation::{
    ProcessMessageCommand, ProcessMessageError, ProcessMessageHandler,
};
use crate::domain::chat::{ChatChunk, ChunkData};
use crate::domain::foundation::{MessageId, SessionId};
use crate::domain::lead::Stage;
use crate::ports::{AIError, AIProvider, GenerationRequest, GenerationStream, GenerationUnit, Message};

/// Only supported request protocol version.
pub const CHAT_PROTOCOL_VERSION: u32 = 1;

const CHUNK_BUFFER: usize = 32;

/// Ordered chunks of one assistant turn.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ChatChunk> + Send>>;

/// Chat request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Missing versions read as 0 and are rejected like any other mismatch.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Command to stream one assistant turn.
#[derive(Debug, Clone)]
pub struct StreamChatCommand {
    pub session_id: Option<SessionId>,
    pub request: ChatRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum StreamChatError {
    #[error("Unsupported chat protocol version: {0}")]
    UnsupportedVersion(u32),

    #[error("Chat request has no messages")]
    EmptyMessages,

    #[error(transparent)]
    Processing(#[from] ProcessMessageError),
}

/// Generation parameters applied to every turn.
#[derive(Debug, Clone)]
pub struct StreamChatConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for StreamChatConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

pub struct StreamChatHandler {
    ai_provider: Arc<dyn AIProvider>,
    messages: Option<Arc<ProcessMessageHandler>>,
    capabilities: Option<Arc<RecordCapabilityHandler>>,
    config: StreamChatConfig,
}

impl StreamChatHandler {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self {
            ai_provider,
            messages: None,
            capabilities: None,
            config: StreamChatConfig::default(),
        }
    }

    /// Runs the last user message through stage processing when a session
    /// id is known.
    pub fn with_message_processing(mut self, messages: Arc<ProcessMessageHandler>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Records tool results as capabilities when a session id is known.
    pub fn with_capability_tracking(mut self, capabilities: Arc<RecordCapabilityHandler>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_config(mut self, config: StreamChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the request and starts the turn.
    ///
    /// Validation and stage processing failures are returned before any
    /// chunk is produced. Generation failures surface as a terminal `error`
    /// chunk.
    pub async fn handle(&self, cmd: StreamChatCommand) -> Result<ChunkStream, StreamChatError> {
        let StreamChatCommand {
            session_id,
            request,
        } = cmd;
        if request.version != CHAT_PROTOCOL_VERSION {
            return Err(StreamChatError::UnsupportedVersion(request.version));
        }
        if request.messages.is_empty() {
            return Err(StreamChatError::EmptyMessages);
        }

        let mut generation = GenerationRequest::new(request.messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        if let Some(session_id) = &session_id {
            let stage = self.process_last_message(session_id, &generation).await?;
            if let Some(stage) = stage {
                generation = generation.with_system_prompt(system_prompt(stage));
            }
            generation = generation.with_session(session_id.clone());
        }

        let message_id = MessageId::new();
        tracing::debug!(
            message_id = %message_id,
            session_id = session_id.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            provider = %self.ai_provider.provider_info().name,
            "Starting chat turn"
        );

        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let pump = ChunkPump {
            sequencer: ChunkSequencer::new(message_id),
            tx,
            session_id,
            capabilities: self.capabilities.clone(),
        };
        match self.ai_provider.stream_complete(generation).await {
            Ok(units) => {
                tokio::spawn(pump.run(units));
            }
            Err(err) => {
                tokio::spawn(pump.fail(err));
            }
        }

        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })))
    }

    async fn process_last_message(
        &self,
        session_id: &SessionId,
        generation: &GenerationRequest,
    ) -> Result<Option<Stage>, StreamChatError> {
        let Some(messages) = &self.messages else {
            return Ok(None);
        };
        let Some(content) = generation
            .last_user_message()
            .filter(|content| !content.trim().is_empty())
        else {
            return Ok(None);
        };
        let result = messages
            .handle(ProcessMessageCommand::new(session_id.clone(), content))
            .await?;
        Ok(Some(result.stage))
    }
}

/// Guidance handed to the generator for the current stage.
fn system_prompt(stage: Stage) -> String {
    let goal = match stage {
        Stage::Greeting | Stage::NameCollection => "Greet the visitor and ask for their name.",
        Stage::EmailCapture => "Ask for a work email so you can follow up.",
        Stage::BackgroundResearch | Stage::ProblemDiscovery => {
            "Ask about the manual or slow processes that hold the team back."
        }
        Stage::SolutionPresentation => {
            "Show how automation addresses the problems the visitor described."
        }
        Stage::CallToAction => "Offer to schedule a call and confirm next steps.",
    };
    format!("Conversation stage: {stage}. {goal}")
}

/// Assigns sequence numbers under one message id.
#[derive(Debug)]
struct ChunkSequencer {
    id: MessageId,
    next_seq: u64,
}

impl ChunkSequencer {
    fn new(id: MessageId) -> Self {
        Self { id, next_seq: 0 }
    }

    fn next(&mut self, data: ChunkData) -> ChatChunk {
        let chunk = ChatChunk::new(self.id, self.next_seq, data);
        self.next_seq += 1;
        chunk
    }
}

struct ChunkPump {
    sequencer: ChunkSequencer,
    tx: mpsc::Sender<ChatChunk>,
    session_id: Option<SessionId>,
    capabilities: Option<Arc<RecordCapabilityHandler>>,
}

impl ChunkPump {
    async fn run(mut self, mut units: GenerationStream) {
        while let Some(unit) = units.next().await {
            let data = match unit {
                Ok(GenerationUnit::Text(text)) => ChunkData::Text(text),
                Ok(GenerationUnit::Tool { name, output }) => {
                    self.record_capability(&name, &output).await;
                    ChunkData::Tool { name, output }
                }
                Err(err) => return self.fail(err).await,
            };
            if !self.send(data).await {
                tracing::debug!(message_id = %self.sequencer.id, "Chat client went away");
                return;
            }
        }
        self.send(ChunkData::Done).await;
    }

    async fn fail(mut self, err: AIError) {
        tracing::warn!(
            message_id = %self.sequencer.id,
            error = %err,
            retryable = err.is_retryable(),
            "Chat generation failed"
        );
        self.send(ChunkData::Error(err.to_string())).await;
    }

    async fn send(&mut self, data: ChunkData) -> bool {
        let chunk = self.sequencer.next(data);
        self.tx.send(chunk).await.is_ok()
    }

    async fn record_capability(&self, name: &str, output: &serde_json::Value) {
        let (Some(session_id), Some(capabilities)) = (&self.session_id, &self.capabilities) else {
            return;
        };
        let cmd = RecordCapabilityCommand {
            session_id: session_id.clone(),
            name: name.to_string(),
            metadata: Some(output.clone()),
        };
        if let Err(err) = capabilities.handle(cmd).await {
            tracing::warn!(
                session_id = %session_id,
                capability = %name,
                error = %err,
                "Failed to record capability"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{tool_unit, MockAIProvider, MockError};
    use crate::adapters::memory::{
        InMemoryCapabilityTracker, InMemoryContextStore, InMemoryLeadRepository,
    };
    use crate::application::session_locks::SessionLocks;
    use crate::domain::chat::ChunkKind;
    use crate::domain::lead::StageTransitionEngine;
    use crate::ports::{CapabilityTracker, LeadRepository};
    use serde_json::json;

    fn request(messages: Vec<Message>) -> StreamChatCommand {
        StreamChatCommand {
            session_id: None,
            request: ChatRequest {
                version: CHAT_PROTOCOL_VERSION,
                messages,
            },
        }
    }

    async fn collect(handler: &StreamChatHandler, cmd: StreamChatCommand) -> Vec<ChatChunk> {
        handler.handle(cmd).await.unwrap().collect().await
    }

    mod validation {
        use super::*;

        #[tokio::test]
        async fn rejects_wrong_version() {
            let handler = StreamChatHandler::new(Arc::new(MockAIProvider::new()));
            let mut cmd = request(vec![Message::user("hi")]);
            cmd.request.version = 2;
            assert!(matches!(
                handler.handle(cmd).await,
                Err(StreamChatError::UnsupportedVersion(2))
            ));
        }

        #[tokio::test]
        async fn rejects_empty_messages() {
            let provider = Arc::new(MockAIProvider::new());
            let handler = StreamChatHandler::new(provider.clone());
            assert!(matches!(
                handler.handle(request(vec![])).await,
                Err(StreamChatError::EmptyMessages)
            ));
            assert_eq!(provider.call_count(), 0);
        }

        #[test]
        fn request_deserializes_from_wire_shape() {
            let request: ChatRequest = serde_json::from_value(json!({
                "version": 1,
                "messages": [{"role": "user", "content": "hi"}]
            }))
            .unwrap();
            assert_eq!(request.messages, vec![Message::user("hi")]);
        }
    }

    mod streaming {
        use super::*;

        #[tokio::test]
        async fn text_units_become_ordered_chunks_then_done() {
            let provider = MockAIProvider::new().with_tokens(["Hel", "lo", " world"]);
            let handler = StreamChatHandler::new(Arc::new(provider));
            let chunks = collect(&handler, request(vec![Message::user("hi")])).await;

            assert_eq!(chunks.len(), 4);
            assert!(chunks.iter().all(|c| c.id == chunks[0].id));
            assert_eq!(
                chunks.iter().map(|c| c.seq).collect::<Vec<_>>(),
                vec![0, 1, 2, 3]
            );
            assert_eq!(chunks[0].data, ChunkData::Text("Hel".to_string()));
            assert_eq!(chunks[3].data, ChunkData::Done);
        }

        #[tokio::test]
        async fn mid_stream_failure_ends_with_error_chunk() {
            let provider = MockAIProvider::new().with_failure_after(
                ["partial"],
                MockError::Network {
                    message: "reset".to_string(),
                },
            );
            let handler = StreamChatHandler::new(Arc::new(provider));
            let chunks = collect(&handler, request(vec![Message::user("hi")])).await;

            let kinds: Vec<_> = chunks.iter().map(|c| c.kind()).collect();
            assert_eq!(kinds, vec![ChunkKind::Text, ChunkKind::Error]);
            assert!(chunks[1].is_terminal());
        }

        #[tokio::test]
        async fn start_failure_is_a_single_error_chunk() {
            let provider = MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".to_string(),
            });
            let handler = StreamChatHandler::new(Arc::new(provider));
            let chunks = collect(&handler, request(vec![Message::user("hi")])).await;

            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].seq, 0);
            assert_eq!(chunks[0].kind(), ChunkKind::Error);
        }

        #[tokio::test]
        async fn generation_parameters_come_from_config() {
            let provider = Arc::new(MockAIProvider::new().with_tokens(["ok"]));
            let handler = StreamChatHandler::new(provider.clone()).with_config(StreamChatConfig {
                temperature: 0.2,
                max_tokens: 64,
            });
            collect(&handler, request(vec![Message::user("hi")])).await;

            let call = &provider.get_calls()[0];
            assert_eq!(call.temperature, Some(0.2));
            assert_eq!(call.max_tokens, Some(64));
            assert!(call.system_prompt.is_none());
        }
    }

    mod sessions {
        use super::*;

        struct Fixture {
            leads: Arc<InMemoryLeadRepository>,
            tracker: Arc<InMemoryCapabilityTracker>,
            provider: Arc<MockAIProvider>,
            handler: StreamChatHandler,
        }

        fn fixture(provider: MockAIProvider) -> Fixture {
            let leads = Arc::new(InMemoryLeadRepository::new());
            let contexts = Arc::new(InMemoryContextStore::new());
            let tracker = Arc::new(InMemoryCapabilityTracker::new());
            let provider = Arc::new(provider);
            let messages = ProcessMessageHandler::new(
                leads.clone(),
                contexts.clone(),
                StageTransitionEngine::default(),
                SessionLocks::new(),
            );
            let capabilities = RecordCapabilityHandler::new(tracker.clone(), contexts);
            let handler = StreamChatHandler::new(provider.clone())
                .with_message_processing(Arc::new(messages))
                .with_capability_tracking(Arc::new(capabilities));
            Fixture {
                leads,
                tracker,
                provider,
                handler,
            }
        }

        fn session_request(messages: Vec<Message>) -> StreamChatCommand {
            StreamChatCommand {
                session_id: Some(SessionId::parse("chat-1").unwrap()),
                ..request(messages)
            }
        }

        #[tokio::test]
        async fn last_user_message_advances_stage() {
            let fixture = fixture(MockAIProvider::new().with_tokens(["Hi!"]));
            collect(&fixture.handler, session_request(vec![Message::user("Hello")])).await;

            let record = fixture
                .leads
                .find(&SessionId::parse("chat-1").unwrap())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(record.stage, Stage::NameCollection);

            let call = &fixture.provider.get_calls()[0];
            assert!(call
                .system_prompt
                .as_deref()
                .unwrap()
                .contains("NAME_COLLECTION"));
            assert!(call.session_id.is_some());
        }

        #[tokio::test]
        async fn tool_results_are_recorded_as_capabilities() {
            let fixture = fixture(MockAIProvider::new().with_units(vec![
                GenerationUnit::Text("Here you go".to_string()),
                tool_unit("roi-calculator", json!({"savings": 1200})),
            ]));
            let chunks =
                collect(&fixture.handler, session_request(vec![Message::user("Hello")])).await;
            assert_eq!(chunks[1].kind(), ChunkKind::Tool);

            let recorded = fixture
                .tracker
                .list(&SessionId::parse("chat-1").unwrap())
                .await
                .unwrap();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].name, "roi-calculator");
        }

        #[tokio::test]
        async fn processing_failure_is_returned_before_streaming() {
            let fixture = fixture(MockAIProvider::new());
            fixture.leads.set_fail_writes(true);
            let result = fixture
                .handler
                .handle(session_request(vec![Message::user("Hello")]))
                .await;
            assert!(matches!(result, Err(StreamChatError::Processing(_))));
            assert_eq!(fixture.provider.call_count(), 0);
        }
    }
}
