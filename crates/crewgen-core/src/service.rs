//! Asynchronous generation sessions.
//!
//! [`GenerationService::start`] creates a session and hands it to a detached
//! tokio task. The registry is the only thing the worker and status readers
//! share.

use crate::config::{Credentials, CrewgenConfig};
use crate::error::{CoreError, Result};
use crate::generation::{GenerationRequest, ModelInvoker, Orchestrator};
use crate::jobs::{InMemoryJobRegistry, JobRegistry, JobStage, JobStatus, SessionId};
use crate::scaffold::{FsScaffolder, ScaffoldContext, Scaffolder};
use chrono::Utc;
use crewgen_models::ProviderSpec;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// A started session.
#[derive(Debug)]
pub struct GenerationHandle {
    session_id: SessionId,
    completion: JoinHandle<JobStatus>,
}

impl GenerationHandle {
    /// Identifier to poll with.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the worker has exited, normally or by panicking.
    pub fn is_finished(&self) -> bool {
        self.completion.is_finished()
    }

    /// Waits for the worker and returns the terminal record.
    ///
    /// Dropping the handle instead leaves the worker running.
    pub async fn wait(self) -> std::result::Result<JobStatus, JoinError> {
        self.completion.await
    }
}

/// Entry point for starting and observing generation sessions.
#[derive(Clone)]
pub struct GenerationService {
    orchestrator: Orchestrator,
    registry: Arc<dyn JobRegistry>,
    scaffolder: Arc<dyn Scaffolder>,
}

impl GenerationService {
    /// Creates a service from its collaborators.
    pub fn new(
        orchestrator: Orchestrator,
        registry: Arc<dyn JobRegistry>,
        scaffolder: Arc<dyn Scaffolder>,
    ) -> Self {
        Self { orchestrator, registry, scaffolder }
    }

    /// Creates a service with an in-memory registry and file system output.
    pub fn from_config(config: &CrewgenConfig, credentials: Credentials) -> Self {
        let mut registry = InMemoryJobRegistry::new();
        if let Some(capacity) = config.registry.capacity {
            registry = registry.with_capacity(capacity);
        }
        if let Some(ttl) = config.ttl() {
            registry = registry.with_ttl(ttl);
        }

        Self::new(
            Orchestrator::new(ModelInvoker::new(credentials)),
            Arc::new(registry),
            Arc::new(FsScaffolder::new(config.output_dir())),
        )
    }

    /// Starts a session and returns without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: GenerationRequest) -> Result<GenerationHandle> {
        if request.topic.trim().is_empty() {
            return Err(CoreError::EmptyTopic);
        }

        self.registry.expire(Utc::now())?;

        let session_id = SessionId::new();
        let ctx = ScaffoldContext::new(session_id, request.topic.as_str());
        let status = JobStatus::started(session_id, ctx.project_name.clone());
        self.registry.create(status.clone())?;

        info!(
            session_id = %session_id,
            project = %ctx.project_name,
            provider = %request.provider,
            model = %request.model,
            "Generation started"
        );

        let worker = Worker {
            orchestrator: self.orchestrator.clone(),
            registry: Arc::clone(&self.registry),
            scaffolder: Arc::clone(&self.scaffolder),
            ctx,
        };
        let completion = tokio::spawn(worker.run(request, status));

        Ok(GenerationHandle { session_id, completion })
    }

    /// Current record of a session.
    pub fn status(&self, session_id: &SessionId) -> Result<Arc<JobStatus>> {
        Ok(self.registry.get(session_id)?)
    }

    /// Packaged project of a completed session.
    pub fn artifact(&self, session_id: &SessionId) -> Result<PathBuf> {
        let status = self.status(session_id)?;
        match (&status.stage, &status.artifact) {
            (JobStage::Completed, Some(artifact)) => Ok(artifact.clone()),
            (stage, _) => Err(CoreError::NotReady { session_id: *session_id, stage: *stage }),
        }
    }

    /// The provider catalog.
    pub fn providers() -> &'static [ProviderSpec] {
        ProviderSpec::all()
    }

    /// Models advertised by a provider; empty for unknown ids.
    pub fn models_for(provider_id: &str) -> &'static [&'static str] {
        crewgen_models::models_for(provider_id)
    }
}

/// Sole writer of one session's records.
struct Worker {
    orchestrator: Orchestrator,
    registry: Arc<dyn JobRegistry>,
    scaffolder: Arc<dyn Scaffolder>,
    ctx: ScaffoldContext,
}

impl Worker {
    async fn run(self, request: GenerationRequest, mut status: JobStatus) -> JobStatus {
        let last = match self.drive(&request, &mut status).await {
            Ok(artifact) => {
                info!(
                    session_id = %self.ctx.session_id,
                    artifact = %artifact.display(),
                    "Generation completed"
                );
                status.completed(artifact)
            }
            Err(e) => {
                error!(session_id = %self.ctx.session_id, error = %e, "Generation failed");
                status.failed(&e)
            }
        };

        if let Err(e) = self.registry.update(last.clone()) {
            warn!(session_id = %self.ctx.session_id, error = %e, "Could not record final status");
        }
        last
    }

    async fn drive(&self, request: &GenerationRequest, status: &mut JobStatus) -> Result<PathBuf> {
        for stage in [
            JobStage::CreatingStructure,
            JobStage::CreatingConfig,
            JobStage::CreatingCrew,
            JobStage::CreatingMain,
            JobStage::CreatingTools,
            JobStage::GeneratingAi,
        ] {
            self.enter(status, stage)?;
        }

        let outcome = self.orchestrator.generate(request).await;
        *status = status.clone().with_source(outcome.source.to_string());

        self.enter(status, JobStage::WritingConfig)?;
        let rendered = outcome.pair.render()?;
        self.scaffolder.write_config(&self.ctx, &rendered)?;

        self.enter(status, JobStage::Finalizing)?;
        self.enter(status, JobStage::Zipping)?;
        Ok(self.scaffolder.package(&self.ctx)?)
    }

    fn enter(&self, status: &mut JobStatus, stage: JobStage) -> Result<()> {
        *status = status.advanced(stage);
        self.registry.update(status.clone())?;
        self.scaffolder.prepare_stage(&self.ctx, stage)?;
        Ok(())
    }
}
