//! Preview command implementation.

use anyhow::{bail, Result};
use colored::Colorize;
use crewgen_core::generation::{fallback, parser, sanitizer};

/// Execute the preview command.
pub fn execute(topic: &str) -> Result<()> {
    if topic.trim().is_empty() {
        bail!("topic must not be empty");
    }

    let pair = sanitizer::sanitize(fallback::generate(topic));
    let rendered = pair.render()?;

    println!("{}", parser::AGENTS_MARKER.bold());
    print!("{}", rendered.agents_yaml);
    println!("{}", parser::TASKS_MARKER.bold());
    print!("{}", rendered.tasks_yaml);
    Ok(())
}
