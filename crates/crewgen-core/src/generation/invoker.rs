//! One-shot call to the language model.

use super::prompt::PromptBuilder;
use super::GenerationRequest;
use crate::config::Credentials;
use chrono::Datelike;
use crewgen_abstraction::{Model, ModelError};
use crewgen_models::{ModelConfig, ModelFactory, ModelRoute};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why no usable text came back from the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeFailure {
    /// The serving backend has no credential configured; nothing was sent.
    #[error("no credential configured ({0} is not set)")]
    MissingCredential(&'static str),

    /// The model could not be built or the call failed.
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    /// The call succeeded but returned only whitespace.
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Raw text returned by a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Model that served the call.
    pub model_id: String,
    /// Trimmed response text.
    pub text: String,
}

/// Builds model instances for a resolved route.
pub trait ModelSource: Send + Sync {
    /// Creates the model described by `config`.
    fn build(&self, config: ModelConfig) -> Result<Arc<dyn Model + Send + Sync>, ModelError>;
}

/// [`ModelSource`] backed by [`ModelFactory`].
#[derive(Debug, Clone, Default)]
pub struct FactorySource {
    base_url: Option<String>,
}

impl FactorySource {
    /// Points every Gemini model at `base_url` instead of the public endpoint.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: Some(base_url.into()) }
    }
}

impl ModelSource for FactorySource {
    fn build(&self, config: ModelConfig) -> Result<Arc<dyn Model + Send + Sync>, ModelError> {
        let config = match &self.base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        };
        ModelFactory::create(config)
    }
}

/// Issues the generation call.
#[derive(Clone)]
pub struct ModelInvoker {
    credentials: Credentials,
    source: Arc<dyn ModelSource>,
}

impl ModelInvoker {
    /// Invoker using the default model factory.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials, source: Arc::new(FactorySource::default()) }
    }

    /// Replaces the model source.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn ModelSource>) -> Self {
        self.source = source;
        self
    }

    /// Sends the prompt for `request` once. Failures are returned, never retried.
    pub async fn invoke(&self, request: &GenerationRequest) -> Result<Invocation, InvokeFailure> {
        let route = ModelRoute::resolve(request.provider, &request.model);
        let Some(api_key) = self.credentials.get(route.backend) else {
            debug!(credential = route.credential_env(), "Credential not configured");
            return Err(InvokeFailure::MissingCredential(route.credential_env()));
        };

        let config = ModelConfig::for_route(&route).with_api_key(api_key.to_string());
        let model = self.source.build(config)?;

        let prompt = PromptBuilder::build(&request.topic, current_year());
        debug!(model_id = %route.model_id, prompt_len = prompt.len(), "Invoking model");

        let response = model.generate_text(&prompt, None).await.map_err(|e| {
            warn!(model_id = %route.model_id, error = %e, "Model call failed");
            InvokeFailure::Model(e)
        })?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(InvokeFailure::EmptyResponse);
        }

        Ok(Invocation {
            model_id: response.model_id.unwrap_or(route.model_id),
            text: text.to_string(),
        })
    }
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}
