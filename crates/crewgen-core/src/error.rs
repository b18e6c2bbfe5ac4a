//! Error types for crewgen-core.

use crate::config::ConfigError;
use crate::generation::DocumentError;
use crate::jobs::{JobError, JobStage, SessionId};
use crate::scaffold::ScaffoldError;
use crewgen_models::UnknownProvider;
use thiserror::Error;

/// Errors surfaced to callers of the core.
///
/// Model and provider failures never appear here; they are absorbed by the
/// fallback path.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The topic was empty or whitespace; no session was created.
    #[error("topic must not be empty")]
    EmptyTopic,

    /// The artifact was requested before the session completed.
    #[error("session {session_id} is not ready (status: {stage})")]
    NotReady {
        /// Session queried.
        session_id: SessionId,
        /// Its current stage.
        stage: JobStage,
    },

    /// Job registry error.
    #[error(transparent)]
    Job(#[from] JobError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scaffolding error.
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),

    /// Document serialization error.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Provider not in the catalog.
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
