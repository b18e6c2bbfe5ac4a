//! End-to-end generation scenarios.

use chrono::{DateTime, Utc};
use crewgen_core::generation::{FactorySource, ModelInvoker};
use crewgen_core::{
    ConfigPair, Credentials, FallbackReason, FsScaffolder, GenerationRequest, GenerationService,
    InMemoryJobRegistry, JobError, JobRegistry, JobStage, JobStatus, Orchestrator, PairSource,
    RenderedConfig, SessionId,
};
use crewgen_models::ProviderKind;
use mockito::Matcher;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Registry that keeps every accepted record in order.
#[derive(Default)]
struct RecordingRegistry {
    inner: InMemoryJobRegistry,
    history: Mutex<Vec<JobStatus>>,
}

impl RecordingRegistry {
    fn history_of(&self, session_id: SessionId) -> Vec<JobStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|status| status.session_id == session_id)
            .cloned()
            .collect()
    }
}

impl JobRegistry for RecordingRegistry {
    fn create(&self, status: JobStatus) -> Result<(), JobError> {
        self.inner.create(status.clone())?;
        self.history.lock().unwrap().push(status);
        Ok(())
    }

    fn update(&self, status: JobStatus) -> Result<(), JobError> {
        self.inner.update(status.clone())?;
        self.history.lock().unwrap().push(status);
        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> Result<Arc<JobStatus>, JobError> {
        self.inner.get(session_id)
    }

    fn expire(&self, now: DateTime<Utc>) -> Result<usize, JobError> {
        self.inner.expire(now)
    }

    fn len(&self) -> Result<usize, JobError> {
        self.inner.len()
    }
}

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

fn mocked_orchestrator(server: &mockito::Server) -> Orchestrator {
    let invoker = ModelInvoker::new(Credentials::new().with(ProviderKind::Gemini, "test-key"))
        .with_source(Arc::new(FactorySource::with_base_url(server.url())));
    Orchestrator::new(invoker)
}

fn read_config(project_dir: &Path, project_name: &str) -> ConfigPair {
    let config_dir = project_dir.join("src").join(project_name).join("config");
    let rendered = RenderedConfig {
        agents_yaml: std::fs::read_to_string(config_dir.join("agents.yaml")).unwrap(),
        tasks_yaml: std::fs::read_to_string(config_dir.join("tasks.yaml")).unwrap(),
    };
    ConfigPair::parse(&rendered).unwrap()
}

fn assert_forward_trajectory(history: &[JobStatus]) {
    assert_eq!(history.first().unwrap().stage, JobStage::Starting);
    for window in history.windows(2) {
        assert!(window[0].stage.can_advance_to(window[1].stage), "{:?} -> {:?}", window[0].stage, window[1].stage);
        assert!(window[1].progress >= window[0].progress);
    }
}

#[tokio::test]
async fn test_missing_credential_completes_with_research_fallback() {
    let output = TempDir::new().unwrap();
    let registry = Arc::new(RecordingRegistry::default());
    let service = GenerationService::new(
        Orchestrator::new(ModelInvoker::new(Credentials::new())),
        registry.clone(),
        Arc::new(FsScaffolder::new(output.path())),
    );

    let handle = service.start(GenerationRequest::new("Market research on electric vehicles")).unwrap();
    let session_id = handle.session_id();
    let last = handle.wait().await.unwrap();

    assert_eq!(last.stage, JobStage::Completed);
    assert_eq!(last.progress, 100);
    assert_eq!(last.message, "Project generation completed!");
    assert_eq!(last.project_name, "market_research_on_electric_vehicles");

    let artifact = service.artifact(&session_id).unwrap();
    assert!(artifact.is_file());

    let project_dir = output.path().join(session_id.to_string()).join(&last.project_name);
    let pair = read_config(&project_dir, &last.project_name);
    assert_eq!(pair.agent_names(), vec!["researcher", "analyst"]);
    assert!(pair.is_consistent());

    let history = registry.history_of(session_id);
    assert_forward_trajectory(&history);
    assert_eq!(history.len(), 11);
}

#[tokio::test]
async fn test_unrecognizable_response_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".to_string(), "test-key".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("I am not able to produce configuration files today."))
        .expect(1)
        .create_async()
        .await;

    let outcome = mocked_orchestrator(&server).generate(&GenerationRequest::new("Team offsite plan")).await;

    mock.assert_async().await;
    assert_eq!(outcome.source, PairSource::Fallback { reason: FallbackReason::Unparseable });
    assert!(outcome.pair.is_consistent());
}

#[tokio::test]
async fn test_undeclared_agent_reference_falls_back() {
    let response = "\
--- agents.yaml ---
planner:
  role: Planner
  goal: Plan
  backstory: Plans things
--- tasks.yaml ---
plan_task:
  description: Plan {topic}
  expected_output: Plan
  agent: planner
review_task:
  description: Review for {target_audience}
  expected_output: Review
  agent: reviewer
";
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(gemini_body(response))
        .create_async()
        .await;

    let outcome = mocked_orchestrator(&server).generate(&GenerationRequest::new("Development sprint")).await;

    assert_eq!(
        outcome.source,
        PairSource::Fallback { reason: FallbackReason::Referential { missing: vec!["reviewer".to_string()] } }
    );
    assert_eq!(outcome.pair.agent_names(), vec!["developer", "tester"]);
    assert!(outcome.pair.is_consistent());
}

#[tokio::test]
async fn test_valid_fenced_response_is_accepted_and_sanitized() {
    let response = "\
```yaml
--- agents.yaml ---
digest_curator:
  role: Curator
  goal: Pick stories
  backstory: Reads everything
  verbose: true
  allow_delegation: true
  tools:
    - search
digest_writer:
  role: Writer
  goal: Write the digest
  backstory: Writes crisply
  verbose: true
  allow_delegation: false
--- tasks.yaml ---
curate_task:
  description: Collect stories about {topic} for {recipient_name}
  expected_output: A list
  agent: digest_curator
write_task:
  description: Write to {recipient_name} from {sender_name}
  expected_output: The digest
  agent: digest_writer
```";
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-1.5-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(gemini_body(response))
        .create_async()
        .await;

    let request = GenerationRequest::new("Weekly digest").with_model("gemini-1.5-pro");
    let outcome = mocked_orchestrator(&server).generate(&request).await;

    assert_eq!(outcome.source, PairSource::Model { model_id: "gemini-1.5-pro".to_string() });
    assert_eq!(outcome.pair.agent_names(), vec!["digest_curator", "digest_writer"]);
    let rendered = outcome.pair.render().unwrap();
    assert!(!rendered.agents_yaml.contains("tools"));
    assert!(rendered.tasks_yaml.contains("{recipient_name}"));
}

#[tokio::test]
async fn test_provider_error_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("RESOURCE_EXHAUSTED")
        .create_async()
        .await;

    let request = GenerationRequest::new("Email to investors")
        .with_provider(ProviderKind::Anthropic)
        .with_model("claude-3-opus");
    let outcome = mocked_orchestrator(&server).generate(&request).await;

    assert!(matches!(
        outcome.source,
        PairSource::Fallback { reason: FallbackReason::Invocation { .. } }
    ));
    assert_eq!(outcome.pair.agent_names(), vec!["content_analyzer", "email_composer"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_sessions_are_independent() {
    let output = TempDir::new().unwrap();
    let registry = Arc::new(RecordingRegistry::default());
    let service = GenerationService::new(
        Orchestrator::new(ModelInvoker::new(Credentials::new())),
        registry.clone(),
        Arc::new(FsScaffolder::new(output.path())),
    );

    let first = service.start(GenerationRequest::new("Data quality report")).unwrap();
    let second = service.start(GenerationRequest::new("Marketing launch")).unwrap();
    let (first_id, second_id) = (first.session_id(), second.session_id());
    assert_ne!(first_id, second_id);

    let (first_last, second_last) = tokio::join!(first.wait(), second.wait());
    let (first_last, second_last) = (first_last.unwrap(), second_last.unwrap());

    for (session_id, last, project) in [
        (first_id, first_last, "data_quality_report"),
        (second_id, second_last, "marketing_launch"),
    ] {
        assert_eq!(last.stage, JobStage::Completed);
        assert_eq!(last.session_id, session_id);

        let history = registry.history_of(session_id);
        assert_forward_trajectory(&history);
        assert!(history.iter().all(|status| status.project_name == project));
        assert_eq!(history.last().unwrap().stage, JobStage::Completed);
    }

    let first_pair = read_config(&output.path().join(first_id.to_string()).join("data_quality_report"), "data_quality_report");
    let second_pair = read_config(&output.path().join(second_id.to_string()).join("marketing_launch"), "marketing_launch");
    assert_eq!(first_pair.agent_names(), vec!["data_scientist", "analyst"]);
    assert_eq!(second_pair.agent_names(), vec!["marketer", "strategist"]);
}
