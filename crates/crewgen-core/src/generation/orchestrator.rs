//! Failure cascade from model output to an accepted pair.
//!
//! Every failure point downgrades to the fallback pair once; nothing is
//! retried and no half of a rejected pair is reused.

use super::documents::ConfigPair;
use super::invoker::{InvokeFailure, Invocation, ModelInvoker};
use super::parser::ResponseParser;
use super::validator::{self, ValidationError};
use super::{fallback, sanitizer, GenerationRequest};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Why the fallback pair was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No credential for the serving backend.
    MissingCredential,
    /// The model could not be reached or reported an error.
    Invocation {
        /// Error reported by the model layer.
        message: String,
    },
    /// The model answered with nothing.
    EmptyResponse,
    /// The response had no recognizable document boundary.
    Unparseable,
    /// A document was malformed.
    Structural {
        /// Validation message.
        message: String,
    },
    /// Tasks referenced undeclared agents.
    Referential {
        /// The undeclared names.
        missing: Vec<String>,
    },
}

impl From<InvokeFailure> for FallbackReason {
    fn from(failure: InvokeFailure) -> Self {
        match failure {
            InvokeFailure::MissingCredential(_) => Self::MissingCredential,
            InvokeFailure::Model(e) => Self::Invocation { message: e.to_string() },
            InvokeFailure::EmptyResponse => Self::EmptyResponse,
        }
    }
}

impl From<ValidationError> for FallbackReason {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::Structural { .. } => Self::Structural { message: error.to_string() },
            ValidationError::Referential { missing } => Self::Referential { missing },
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => f.write_str("no credential configured"),
            Self::Invocation { message } => write!(f, "model call failed: {message}"),
            Self::EmptyResponse => f.write_str("empty model response"),
            Self::Unparseable => f.write_str("unparseable model response"),
            Self::Structural { message } => f.write_str(message),
            Self::Referential { missing } => {
                write!(f, "tasks reference undeclared agents: {}", missing.join(", "))
            }
        }
    }
}

/// Where the final pair came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PairSource {
    /// Accepted model output.
    Model {
        /// Model that produced it.
        model_id: String,
    },
    /// The deterministic fallback.
    Fallback {
        /// What went wrong on the model path.
        reason: FallbackReason,
    },
}

impl fmt::Display for PairSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model { model_id } => write!(f, "generated by {model_id}"),
            Self::Fallback { reason } => write!(f, "fallback ({reason})"),
        }
    }
}

/// Result of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// The sanitized, consistent pair.
    pub pair: ConfigPair,
    /// Its origin.
    pub source: PairSource,
}

impl GenerationOutcome {
    /// Whether the fallback pair was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PairSource::Fallback { .. })
    }
}

/// Runs the model path and the fallback branch.
#[derive(Clone)]
pub struct Orchestrator {
    invoker: ModelInvoker,
}

impl Orchestrator {
    /// Creates an orchestrator around `invoker`.
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Produces the final pair for `request`. Never fails.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let invocation = self.invoker.invoke(request).await;
        Self::finalize(&request.topic, invocation)
    }

    /// Turns the model call result into an outcome.
    pub fn finalize(topic: &str, invocation: Result<Invocation, InvokeFailure>) -> GenerationOutcome {
        let result = invocation.map_err(FallbackReason::from).and_then(|invocation| {
            Self::accept(&invocation.text).map(|pair| (pair, invocation.model_id))
        });

        match result {
            Ok((pair, model_id)) => {
                info!(model_id = %model_id, agents = ?pair.agent_names(), "Accepted model output");
                GenerationOutcome { pair: sanitizer::sanitize(pair), source: PairSource::Model { model_id } }
            }
            Err(reason) => {
                warn!(reason = %reason, "Using fallback configuration");
                GenerationOutcome {
                    pair: sanitizer::sanitize(fallback::generate(topic)),
                    source: PairSource::Fallback { reason },
                }
            }
        }
    }

    fn accept(text: &str) -> Result<ConfigPair, FallbackReason> {
        let candidate = ResponseParser::parse(text).map_err(|_| FallbackReason::Unparseable)?;
        Ok(validator::validate(&candidate.agents_yaml, &candidate.tasks_yaml)?)
    }
}
