//! Mock AI Provider for testing and local runs.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing the chat transport to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured token scripts, consumed in order
//! - Mid-stream failure injection
//! - Simulated delays per token
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_tokens(["Hel", "lo", " world"])
//!     .with_token_delay(Duration::from_millis(5));
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, GenerationRequest, GenerationStream, GenerationUnit, ProviderInfo,
};

const DEFAULT_REPLY: &str = "Thanks for reaching out! Tell me a bit about what you are working on.";

/// Mock AI provider.
///
/// Configurable to return specific token scripts, simulate delays, or inject errors.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Simulated latency before each unit.
    token_delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Stream these units, then optionally fail.
    Stream {
        units: Vec<GenerationUnit>,
        then_fail: Option<MockError>,
    },
    /// Fail before streaming anything.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            token_delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a reply streamed as the given text fragments.
    pub fn with_tokens<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let units = tokens
            .into_iter()
            .map(|t| GenerationUnit::Text(t.into()))
            .collect();
        self.with_units(units)
    }

    /// Queues a reply made of arbitrary units.
    pub fn with_units(self, units: Vec<GenerationUnit>) -> Self {
        self.push(MockResponse::Stream {
            units,
            then_fail: None,
        })
    }

    /// Queues a reply that streams `tokens` and then fails.
    pub fn with_failure_after<I, S>(self, tokens: I, error: MockError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let units = tokens
            .into_iter()
            .map(|t| GenerationUnit::Text(t.into()))
            .collect();
        self.push(MockResponse::Stream {
            units,
            then_fail: Some(error),
        })
    }

    /// Queues a reply that fails before streaming.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Reports `model` in provider info.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.info.model = model.into();
        self
    }

    /// Sets simulated latency before each unit.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Gets the next response or a default reply.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Stream {
                units: DEFAULT_REPLY
                    .split_inclusive(' ')
                    .map(|word| GenerationUnit::Text(word.to_string()))
                    .collect(),
                then_fail: None,
            })
    }
}

/// Builds a tool unit.
pub fn tool_unit(name: impl Into<String>, output: Value) -> GenerationUnit {
    GenerationUnit::Tool {
        name: name.into(),
        output,
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn stream_complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationStream, AIError> {
        self.calls.lock().unwrap().push(request);

        let (units, then_fail) = match self.next_response() {
            MockResponse::Stream { units, then_fail } => (units, then_fail),
            MockResponse::Error(err) => return Err(err.into()),
        };

        let delay = self.token_delay;
        let items: Vec<Result<GenerationUnit, AIError>> = units
            .into_iter()
            .map(Ok)
            .chain(then_fail.map(|err| Err(err.into())))
            .collect();

        let stream = stream::iter(items).then(move |item| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
