//! Model factory and route resolution.
//!
//! Every provider selection is resolved to a concrete backend before a model
//! is built. Only the Gemini backend is implemented; other selections are
//! served by the Gemini baseline model.

use crate::catalog::{ProviderKind, ProviderSpec};
use crate::GeminiModel;
use crewgen_abstraction::{Model, ModelError};
use std::sync::Arc;
use tracing::debug;

/// Model used whenever a selection cannot be served as requested.
pub const BASELINE_MODEL: &str = "gemini-1.5-flash";

/// Backends that can actually serve a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Google Gemini model.
    Gemini,
}

/// A provider/model selection resolved to the backend that will serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoute {
    /// What the caller asked for.
    pub requested_provider: ProviderKind,
    /// Model id the caller asked for.
    pub requested_model: String,
    /// Backend that will serve the call.
    pub backend: ProviderKind,
    /// Model id sent to the backend.
    pub model_id: String,
}

impl ModelRoute {
    /// Resolves a selection.
    ///
    /// `(Gemini, "gemini*")` is served as requested. Any other combination is
    /// served by the Gemini baseline model.
    #[must_use]
    pub fn resolve(provider: ProviderKind, model_id: &str) -> Self {
        let served = match provider {
            ProviderKind::Gemini if model_id.starts_with("gemini") => model_id.to_string(),
            ProviderKind::Gemini | ProviderKind::OpenAI | ProviderKind::Anthropic => {
                BASELINE_MODEL.to_string()
            }
        };

        if served != model_id {
            debug!(
                provider = %provider,
                requested = %model_id,
                served = %served,
                "Substituting baseline model"
            );
        }

        Self {
            requested_provider: provider,
            requested_model: model_id.to_string(),
            backend: ProviderKind::Gemini,
            model_id: served,
        }
    }

    /// Whether the served model differs from the requested one.
    #[must_use]
    pub fn is_substituted(&self) -> bool {
        self.requested_provider != self.backend || self.requested_model != self.model_id
    }

    /// Name of the credential the serving backend needs.
    #[must_use]
    pub fn credential_env(&self) -> &'static str {
        ProviderSpec::get(self.backend).credential_env
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gemini-1.5-flash").
    pub model_id: String,
    /// API key; creation fails without one.
    pub api_key: Option<String>,
    /// Optional base URL override.
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with the given type and model ID.
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String) -> Self {
        Self { model_type, model_id, api_key: None, base_url: None }
    }

    /// Builds the configuration for a resolved route.
    #[must_use]
    pub fn for_route(route: &ModelRoute) -> Self {
        let model_type = match route.backend {
            ProviderKind::Gemini | ProviderKind::OpenAI | ProviderKind::Anthropic => {
                ModelType::Gemini
            }
        };
        Self::new(model_type, route.model_id.clone())
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from the given configuration.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedModelProvider` when no API key is set.
    pub fn create(config: ModelConfig) -> Result<Arc<dyn Model + Send + Sync>, ModelError> {
        debug!(
            model_type = ?config.model_type,
            model_id = %config.model_id,
            "Creating model instance"
        );

        match config.model_type {
            ModelType::Gemini => {
                let api_key = config.api_key.ok_or_else(|| {
                    ModelError::UnsupportedModelProvider(format!(
                        "{} is not configured",
                        ProviderSpec::get(ProviderKind::Gemini).credential_env
                    ))
                })?;
                let model = GeminiModel::with_api_key(config.model_id, api_key);
                let model = match config.base_url {
                    Some(base_url) => model.with_base_url(base_url),
                    None => model,
                };
                Ok(Arc::new(model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_selection_is_kept() {
        let route = ModelRoute::resolve(ProviderKind::Gemini, "gemini-1.5-pro");
        assert_eq!(route.model_id, "gemini-1.5-pro");
        assert_eq!(route.backend, ProviderKind::Gemini);
        assert!(!route.is_substituted());
    }

    #[test]
    fn test_non_gemini_model_on_gemini_is_substituted() {
        let route = ModelRoute::resolve(ProviderKind::Gemini, "gpt-4");
        assert_eq!(route.model_id, BASELINE_MODEL);
        assert!(route.is_substituted());
    }

    #[test]
    fn test_other_providers_use_baseline() {
        for provider in [ProviderKind::OpenAI, ProviderKind::Anthropic] {
            let route = ModelRoute::resolve(provider, "gemini-1.5-pro");
            assert_eq!(route.model_id, BASELINE_MODEL);
            assert_eq!(route.backend, ProviderKind::Gemini);
            assert!(route.is_substituted());
        }
    }

    #[test]
    fn test_route_credential_is_backend_credential() {
        let route = ModelRoute::resolve(ProviderKind::OpenAI, "gpt-4");
        assert_eq!(route.credential_env(), "GEMINI_API_KEY");
    }

    #[test]
    fn test_model_config() {
        let route = ModelRoute::resolve(ProviderKind::Gemini, "gemini-1.0-pro");
        let config = ModelConfig::for_route(&route);
        assert_eq!(config.model_type, ModelType::Gemini);
        assert_eq!(config.model_id, "gemini-1.0-pro");
        assert_eq!(config.api_key, None);

        let config = config.with_api_key("test-key".to_string());
        assert_eq!(config.api_key, Some("test-key".to_string()));
    }

    #[test]
    fn test_factory_requires_api_key() {
        let config = ModelConfig::new(ModelType::Gemini, "gemini-1.5-flash".to_string());
        let Err(err) = ModelFactory::create(config) else {
            panic!("model created without an API key");
        };
        assert_eq!(
            err,
            ModelError::UnsupportedModelProvider("GEMINI_API_KEY is not configured".to_string())
        );
    }

    #[test]
    fn test_factory_create_gemini_with_api_key() {
        let config = ModelConfig::new(ModelType::Gemini, "gemini-1.5-flash".to_string())
            .with_api_key("test-api-key".to_string());
        let model = ModelFactory::create(config).unwrap();
        assert_eq!(model.model_id(), "gemini-1.5-flash");
    }
}
