//! Model implementations for crewgen.
//!
//! This crate provides concrete implementations of the `Model` trait and the
//! provider catalog used to select them.
//!
//! # Supported Backends
//!
//! - **Gemini**: Google's Gemini models (API key required)
//! - **Mock**: [`MockModel`], a scripted stand-in for tests
//!
//! OpenAI and Anthropic appear in the catalog but are served by the Gemini
//! baseline model; see [`ModelRoute::resolve`].

pub mod catalog;
pub mod factory;
pub mod gemini;

use async_trait::async_trait;
use crewgen_abstraction::{
    ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

pub use catalog::{models_for, ProviderKind, ProviderSpec, UnknownProvider};
pub use factory::{ModelConfig, ModelFactory, ModelRoute, ModelType, BASELINE_MODEL};
pub use gemini::GeminiModel;

#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(String),
    Fail(ModelError),
}

/// A mock implementation of the `Model` trait for testing and demonstration.
///
/// `with_response` and `failing` script a fixed outcome. Every call is counted.
#[derive(Debug)]
pub struct MockModel {
    id: String,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockModel {
    /// Creates a `MockModel` that always answers with `content`.
    #[must_use]
    pub fn with_response(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            behavior: MockBehavior::Respond(content.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a `MockModel` that always fails with `error`.
    #[must_use]
    pub fn failing(id: impl Into<String>, error: ModelError) -> Self {
        Self { id: id.into(), behavior: MockBehavior::Fail(error), calls: AtomicUsize::new(0) }
    }

    /// Number of generation calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, prompt_tokens: u32) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = match &self.behavior {
            MockBehavior::Respond(content) => content.clone(),
            MockBehavior::Fail(error) => return Err(error.clone()),
        };

        let completion_tokens = count_tokens(&content);
        Ok(ModelResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "MockModel generating text"
        );

        self.respond(count_tokens(prompt))
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            parameters = ?parameters,
            "MockModel generating chat completion"
        );

        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();
        self.respond(prompt_tokens)
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Count tokens in a string (simplified: word count).
#[allow(clippy::cast_possible_truncation)]
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
