//! Generate command implementation.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use crewgen_core::{
    Credentials, CrewgenConfig, GenerationHandle, GenerationRequest, GenerationService, JobStage,
    JobStatus,
};
use crewgen_models::ProviderKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Options for the generate command.
#[derive(Debug)]
pub struct GenerateOptions {
    pub topic: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Execute the generate command.
pub async fn execute(options: GenerateOptions, mut config: CrewgenConfig) -> Result<()> {
    let provider = match options.provider.as_deref() {
        Some(id) => id.parse::<ProviderKind>()?,
        None => config.provider()?,
    };
    let model = options.model.unwrap_or_else(|| config.model().to_string());
    if let Some(output) = options.output {
        config.generation.output_dir = Some(output);
    }

    let service = GenerationService::from_config(&config, Credentials::from_env());
    let request = GenerationRequest::new(options.topic).with_provider(provider).with_model(model);
    let handle = service.start(request).context("Failed to start generation")?;
    let session_id = handle.session_id();

    if !options.json {
        println!("{} {}", "Session:".bold(), session_id.to_string().cyan());
    }

    let json = options.json;
    let status = await_terminal(&service, &handle, |status| {
        if !json {
            print_milestone(status);
        }
    })
    .await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&*status)?);
    }

    match status.stage {
        JobStage::Completed => {
            if !options.json {
                if let Some(source) = &status.source {
                    println!("  {} {}", "Configuration:".dimmed(), source);
                }
                let artifact = service.artifact(&session_id)?;
                println!("{} {}", "✓".green(), artifact.display().to_string().bold());
            }
            Ok(())
        }
        _ => bail!(status.error.clone().unwrap_or_else(|| status.message.clone())),
    }
}

/// Polls the session until it is terminal, reporting each new stage.
///
/// Fails if the worker exits while the record is still in progress.
async fn await_terminal(
    service: &GenerationService,
    handle: &GenerationHandle,
    mut on_stage: impl FnMut(&JobStatus),
) -> Result<Arc<JobStatus>> {
    let session_id = handle.session_id();
    let mut last_stage = None;

    loop {
        // Checked before reading so a record written just before exit is seen.
        let finished = handle.is_finished();
        let status = service.status(&session_id)?;
        if last_stage != Some(status.stage) {
            on_stage(&status);
            last_stage = Some(status.stage);
        }
        if status.is_terminal() {
            return Ok(status);
        }
        if finished {
            bail!(
                "generation worker stopped during {} without finishing session {}",
                status.stage.as_str(),
                session_id
            );
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_milestone(status: &JobStatus) {
    let progress = format!("[{:>3}%]", status.progress);
    match status.stage {
        JobStage::Error => println!("{} {}", progress.red(), status.message.red()),
        JobStage::Completed => println!("{} {}", progress.green(), status.message.green()),
        _ => println!("{} {}", progress.cyan(), status.message),
    }
}
