//! Session-scoped progress tracking.
//!
//! A session moves through a fixed, strictly forward sequence of stages and
//! ends in `completed` or `error`. Every transition replaces the whole
//! [`JobStatus`] record.

mod registry;

pub use registry::{InMemoryJobRegistry, JobRegistry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// A fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Errors raised by the job registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// No record exists for the session.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// A record already exists for the session.
    #[error("session already exists: {0}")]
    AlreadyExists(SessionId),

    /// The stage does not come after the current one.
    #[error("session {session_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        /// Session being updated.
        session_id: SessionId,
        /// Current stage.
        from: JobStage,
        /// Rejected stage.
        to: JobStage,
    },

    /// Progress would go down.
    #[error("session {session_id}: progress cannot drop from {from} to {to}")]
    ProgressRegression {
        /// Session being updated.
        session_id: SessionId,
        /// Current progress.
        from: u8,
        /// Rejected progress.
        to: u8,
    },

    /// The session already reached `completed` or `error`.
    #[error("session {session_id} is already {stage}")]
    Terminal {
        /// Finished session.
        session_id: SessionId,
        /// Its terminal stage.
        stage: JobStage,
    },

    /// The registry is full and holds no finished session to evict.
    #[error("registry is full ({0} active sessions)")]
    CapacityExceeded(usize),

    /// Lock poisoned.
    #[error("registry lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Stage of a generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Starting,
    CreatingStructure,
    CreatingConfig,
    CreatingCrew,
    CreatingMain,
    CreatingTools,
    GeneratingAi,
    WritingConfig,
    Finalizing,
    Zipping,
    Completed,
    Error,
}

impl JobStage {
    /// Stages a worker walks through between `starting` and `completed`.
    pub const WORK: [Self; 9] = [
        Self::CreatingStructure,
        Self::CreatingConfig,
        Self::CreatingCrew,
        Self::CreatingMain,
        Self::CreatingTools,
        Self::GeneratingAi,
        Self::WritingConfig,
        Self::Finalizing,
        Self::Zipping,
    ];

    /// Wire name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::CreatingStructure => "creating_structure",
            Self::CreatingConfig => "creating_config",
            Self::CreatingCrew => "creating_crew",
            Self::CreatingMain => "creating_main",
            Self::CreatingTools => "creating_tools",
            Self::GeneratingAi => "generating_ai",
            Self::WritingConfig => "writing_config",
            Self::Finalizing => "finalizing",
            Self::Zipping => "zipping",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Progress and message recorded on entering the stage.
    ///
    /// `error` has none: it keeps the progress reached so far.
    #[must_use]
    pub const fn milestone(self) -> Option<(u8, &'static str)> {
        let milestone = match self {
            Self::Starting => (5, "Initializing project generation..."),
            Self::CreatingStructure => (15, "Creating complete project structure..."),
            Self::CreatingConfig => (25, "Creating project configuration..."),
            Self::CreatingCrew => (35, "Creating crew class..."),
            Self::CreatingMain => (45, "Creating main execution file..."),
            Self::CreatingTools => (55, "Creating tools and utilities..."),
            Self::GeneratingAi => (65, "Generating AI configurations..."),
            Self::WritingConfig => (75, "Writing configuration files..."),
            Self::Finalizing => (85, "Creating additional project files..."),
            Self::Zipping => (95, "Creating download package..."),
            Self::Completed => (100, "Project generation completed!"),
            Self::Error => return None,
        };
        Some(milestone)
    }

    /// Whether the stage ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Position in the forward sequence; `error` sits after every other stage.
    const fn rank(self) -> u8 {
        self as u8
    }

    /// Whether a session at `self` may move to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && (matches!(next, Self::Error) || next.rank() > self.rank())
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub session_id: SessionId,
    #[serde(rename = "status")]
    pub stage: JobStage,
    pub message: String,
    /// 0 to 100, never decreasing.
    pub progress: u8,
    /// Packaged project, set once `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub project_name: String,
    /// Where the configuration came from, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    /// Initial record of a session.
    pub fn started(session_id: SessionId, project_name: impl Into<String>) -> Self {
        Self {
            session_id,
            stage: JobStage::Starting,
            message: String::new(),
            progress: 0,
            artifact: None,
            error: None,
            project_name: project_name.into(),
            source: None,
            updated_at: Utc::now(),
        }
        .advanced(JobStage::Starting)
    }

    /// Record for entering `stage`, carrying everything else over.
    ///
    /// Use [`JobStatus::failed`] for the `error` stage.
    #[must_use]
    pub fn advanced(&self, stage: JobStage) -> Self {
        let (progress, message) = stage
            .milestone()
            .map_or_else(|| (self.progress, self.message.clone()), |(p, m)| (p, m.to_string()));

        Self { stage, message, progress, updated_at: Utc::now(), ..self.clone() }
    }

    /// Record for the `completed` stage.
    #[must_use]
    pub fn completed(&self, artifact: PathBuf) -> Self {
        Self { artifact: Some(artifact), ..self.advanced(JobStage::Completed) }
    }

    /// Record for the `error` stage; progress is kept.
    #[must_use]
    pub fn failed(&self, cause: impl fmt::Display) -> Self {
        Self {
            stage: JobStage::Error,
            message: format!("Error: {cause}"),
            error: Some(cause.to_string()),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Attaches the configuration source note.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether the session has finished.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestones_increase() {
        let mut last = JobStage::Starting.milestone().unwrap().0;
        for stage in JobStage::WORK.into_iter().chain([JobStage::Completed]) {
            let (progress, _) = stage.milestone().unwrap();
            assert!(progress > last, "{stage} does not advance progress");
            last = progress;
        }
        assert_eq!(last, 100);
        assert!(JobStage::Error.milestone().is_none());
    }

    #[test]
    fn test_transition_rules() {
        assert!(JobStage::Starting.can_advance_to(JobStage::CreatingStructure));
        assert!(JobStage::Starting.can_advance_to(JobStage::Zipping));
        assert!(JobStage::GeneratingAi.can_advance_to(JobStage::Error));
        assert!(!JobStage::GeneratingAi.can_advance_to(JobStage::GeneratingAi));
        assert!(!JobStage::WritingConfig.can_advance_to(JobStage::CreatingConfig));
        assert!(!JobStage::Completed.can_advance_to(JobStage::Error));
        assert!(!JobStage::Error.can_advance_to(JobStage::Completed));
    }

    #[test]
    fn test_status_records() {
        let id = SessionId::new();
        let started = JobStatus::started(id, "demo");
        assert_eq!(started.stage, JobStage::Starting);
        assert_eq!(started.progress, 5);
        assert_eq!(started.message, "Initializing project generation...");

        let ai = started.advanced(JobStage::GeneratingAi).with_source("fallback");
        assert_eq!(ai.progress, 65);
        assert_eq!(ai.project_name, "demo");

        let failed = ai.failed("disk full");
        assert_eq!(failed.stage, JobStage::Error);
        assert_eq!(failed.progress, 65);
        assert_eq!(failed.message, "Error: disk full");
        assert_eq!(failed.source.as_deref(), Some("fallback"));

        let done = ai.completed(PathBuf::from("/tmp/demo.tar.gz"));
        assert_eq!(done.progress, 100);
        assert_eq!(done.artifact, Some(PathBuf::from("/tmp/demo.tar.gz")));
    }

    #[test]
    fn test_status_serialization() {
        let status = JobStatus::started(SessionId::new(), "demo").advanced(JobStage::GeneratingAi);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "generating_ai");
        assert_eq!(json["progress"], 65);
        assert!(json.get("artifact").is_none());
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
