//! Configuration generation pipeline.
//!
//! Turns a topic into a matched agents/tasks document pair. The model path is
//! prompt → invoke → parse → validate → sanitize; any failure along it is
//! replaced by the deterministic [`fallback`] pair.
//!
//! # Example
//!
//! ```rust
//! use crewgen_core::generation::{fallback, sanitizer};
//!
//! let pair = sanitizer::sanitize(fallback::generate("Weekly email digest"));
//! assert_eq!(pair.agent_names(), vec!["content_analyzer", "email_composer"]);
//! assert!(pair.is_consistent());
//! ```

pub mod documents;
pub mod fallback;
pub mod invoker;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod sanitizer;
pub mod validator;

pub use documents::{
    AgentDefinition, ConfigPair, DocumentError, DocumentKind, RenderedConfig, TaskDefinition,
    PLACEHOLDERS,
};
pub use invoker::{FactorySource, InvokeFailure, Invocation, ModelInvoker, ModelSource};
pub use orchestrator::{FallbackReason, GenerationOutcome, Orchestrator, PairSource};
pub use parser::{CandidatePair, ParseError, ResponseParser};
pub use prompt::PromptBuilder;
pub use validator::ValidationError;

use crewgen_models::{ProviderKind, BASELINE_MODEL};
use serde::{Deserialize, Serialize};

/// What the caller asked to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free-text topic.
    pub topic: String,
    /// Selected provider.
    pub provider: ProviderKind,
    /// Selected model identifier.
    pub model: String,
}

impl GenerationRequest {
    /// Request for `topic` on the default Gemini model.
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into(), provider: ProviderKind::Gemini, model: BASELINE_MODEL.to_string() }
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
