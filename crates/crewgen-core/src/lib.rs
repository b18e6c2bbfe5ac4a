//! Core library for crewgen.
//!
//! Turns a free-text topic into a matched pair of agent and task
//! configuration documents for a multi-agent runtime, tracks each request as
//! a session and writes the result out as a packaged project.
//!
//! The model path can fail in many ways; each failure is absorbed by a
//! deterministic fallback, so a completed session always carries a
//! consistent pair.

pub mod config;
pub mod error;
pub mod generation;
pub mod jobs;
pub mod scaffold;
pub mod service;

pub use config::{ConfigError, Credentials, CrewgenConfig};
pub use error::{CoreError, Result};
pub use generation::{
    ConfigPair, FallbackReason, GenerationOutcome, GenerationRequest, ModelInvoker, Orchestrator,
    PairSource, RenderedConfig,
};
pub use jobs::{InMemoryJobRegistry, JobError, JobRegistry, JobStage, JobStatus, SessionId};
pub use scaffold::{FsScaffolder, ScaffoldContext, ScaffoldError, Scaffolder};
pub use service::{GenerationHandle, GenerationService};
