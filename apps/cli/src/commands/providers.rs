//! Providers command implementation.

use anyhow::Result;
use colored::Colorize;
use crewgen_core::GenerationService;
use serde_json::json;

/// Execute the providers command.
pub fn execute(provider: Option<&str>, json_output: bool) -> Result<()> {
    match provider {
        Some(id) => list_models(id, json_output),
        None => list_providers(json_output),
    }
}

fn list_providers(json_output: bool) -> Result<()> {
    let providers = GenerationService::providers();

    if json_output {
        println!("{}", serde_json::to_string_pretty(providers)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Providers ({})", providers.len()).bold().cyan());
    println!();
    for spec in providers {
        println!("  {} {}", spec.kind.id().bold(), format!("({})", spec.display_name).dimmed());
        println!("    {} {}", "credential:".dimmed(), spec.credential_env);
        println!("    {} {}", "models:".dimmed(), spec.models.join(", "));
    }
    println!();
    Ok(())
}

fn list_models(provider_id: &str, json_output: bool) -> Result<()> {
    let models = GenerationService::models_for(provider_id);

    if json_output {
        println!("{}", json!({ "provider": provider_id, "models": models }));
        return Ok(());
    }

    if models.is_empty() {
        println!("{}", format!("No models for provider '{provider_id}'").yellow());
        return Ok(());
    }
    for model in models {
        println!("{model}");
    }
    Ok(())
}
