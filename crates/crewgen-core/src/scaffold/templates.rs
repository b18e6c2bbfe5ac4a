//! Project files written around the generated documents.
//!
//! Each scaffolding stage owns a fixed set of files. Contents are rendered
//! from the session's topic and project name.

use super::ScaffoldContext;
use crate::generation::documents::PLACEHOLDERS;
use crate::jobs::JobStage;
use std::path::PathBuf;

/// A file to write, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Full file contents.
    pub contents: String,
}

impl ProjectFile {
    fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self { path: path.into(), contents: contents.into() }
    }
}

/// Files written while entering `stage`.
///
/// Stages without files return an empty list.
pub fn files_for(stage: JobStage, ctx: &ScaffoldContext) -> Vec<ProjectFile> {
    let package = PathBuf::from("src").join(&ctx.project_name);

    match stage {
        JobStage::CreatingConfig => vec![
            ProjectFile::new("pyproject.toml", pyproject(ctx)),
            ProjectFile::new("README.md", readme(ctx)),
            ProjectFile::new(".env", ENV_FILE),
        ],
        JobStage::CreatingCrew => vec![ProjectFile::new(package.join("crew.py"), crew_module(ctx))],
        JobStage::CreatingMain => vec![ProjectFile::new(package.join("main.py"), main_module(ctx))],
        JobStage::CreatingTools => vec![
            ProjectFile::new(package.join("tools").join("custom_tool.py"), CUSTOM_TOOL),
            ProjectFile::new(package.join("__init__.py"), ""),
            ProjectFile::new(package.join("config").join("__init__.py"), ""),
            ProjectFile::new(package.join("tools").join("__init__.py"), ""),
        ],
        JobStage::Finalizing => vec![ProjectFile::new(".gitignore", GITIGNORE)],
        JobStage::Starting
        | JobStage::CreatingStructure
        | JobStage::GeneratingAi
        | JobStage::WritingConfig
        | JobStage::Zipping
        | JobStage::Completed
        | JobStage::Error => Vec::new(),
    }
}

/// "market_research" becomes "Market Research".
pub fn display_title(project_name: &str) -> String {
    let mut title = String::with_capacity(project_name.len());
    let mut after_letter = false;
    for c in project_name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_ascii_alphabetic() {
            title.push(if after_letter { c } else { c.to_ascii_uppercase() });
            after_letter = true;
        } else {
            title.push(c);
            after_letter = false;
        }
    }
    title
}

/// Python class name for the crew, always a valid identifier.
pub fn class_name(project_name: &str) -> String {
    let name: String = display_title(project_name).split_whitespace().collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) { format!("Crew{name}") } else { name }
}

/// Quotes `text` as a Python string literal.
fn python_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn pyproject(ctx: &ScaffoldContext) -> String {
    let name = &ctx.project_name;
    format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
description = "{name} using crewAI"
authors = [{{ name = "Your Name", email = "you@example.com" }}]
requires-python = ">=3.10,<3.14"
dependencies = [
    "crewai[tools]>=0.140.0,<1.0.0"
]

[project.scripts]
{name} = "{name}.main:run"
run_crew = "{name}.main:run"
train = "{name}.main:train"
replay = "{name}.main:replay"
test = "{name}.main:test"

[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[tool.crewai]
type = "crew"
"#
    )
}

fn readme(ctx: &ScaffoldContext) -> String {
    let name = &ctx.project_name;
    let title = display_title(name);
    format!(
        r"# {title} Crew

A multi-agent project generated by crewgen, built on [crewAI](https://crewai.com).

## Installation

Requires Python >=3.10 <3.14 and [uv](https://docs.astral.sh/uv/):

```bash
pip install uv
crewai install
```

## Customizing

Add your API keys to `.env`, then edit:

- `src/{name}/config/agents.yaml` for the agents
- `src/{name}/config/tasks.yaml` for the tasks
- `src/{name}/crew.py` for tools and extra arguments
- `src/{name}/main.py` for the inputs passed to the crew

## Running

```bash
crewai run
```

Tasks run in the order they appear in `config/tasks.yaml`, each handled by
the agent it names.
"
    )
}

fn crew_module(ctx: &ScaffoldContext) -> String {
    let class = class_name(&ctx.project_name);
    let title = display_title(&ctx.project_name);
    format!(
        r#"from crewai import Agent, Crew, Process, Task
from crewai.project import CrewBase, crew


@CrewBase
class {class}():
    """{title} crew"""

    agents_config = "config/agents.yaml"
    tasks_config = "config/tasks.yaml"

    @crew
    def crew(self) -> Crew:
        """Creates the {title} crew from the YAML configuration."""
        agents = {{
            name: Agent(config=config)
            for name, config in self.agents_config.items()  # type: ignore[union-attr]
        }}
        tasks = [
            Task(
                config={{key: value for key, value in config.items() if key != "agent"}},
                agent=agents[config["agent"]],
            )
            for config in self.tasks_config.values()  # type: ignore[union-attr]
        ]

        return Crew(
            agents=list(agents.values()),
            tasks=tasks,
            process=Process.sequential,
            verbose=True,
        )
"#
    )
}

fn main_module(ctx: &ScaffoldContext) -> String {
    let name = &ctx.project_name;
    let class = class_name(name);
    let topic = python_literal(&ctx.topic);
    let extra_inputs: String = PLACEHOLDERS
        .iter()
        .map(|p| p.trim_matches(|c| c == '{' || c == '}'))
        .filter(|key| !matches!(*key, "topic" | "current_year"))
        .map(|key| format!("        \"{key}\": \"\",\n"))
        .collect();

    format!(
        r#"#!/usr/bin/env python
import sys
import warnings

from datetime import datetime

from {name}.crew import {class}

warnings.filterwarnings("ignore", category=SyntaxWarning, module="pysbd")

TOPIC = {topic}


def inputs():
    """Values interpolated into the agent and task descriptions."""
    return {{
        "topic": TOPIC,
        "current_year": str(datetime.now().year),
{extra_inputs}    }}


def run():
    """Run the crew."""
    try:
        {class}().crew().kickoff(inputs=inputs())
    except Exception as e:
        raise Exception(f"An error occurred while running the crew: {{e}}")


def train():
    """Train the crew for a given number of iterations."""
    try:
        {class}().crew().train(n_iterations=int(sys.argv[1]), filename=sys.argv[2], inputs=inputs())
    except Exception as e:
        raise Exception(f"An error occurred while training the crew: {{e}}")


def replay():
    """Replay the crew execution from a specific task."""
    try:
        {class}().crew().replay(task_id=sys.argv[1])
    except Exception as e:
        raise Exception(f"An error occurred while replaying the crew: {{e}}")


def test():
    """Test the crew execution and return the results."""
    try:
        {class}().crew().test(n_iterations=int(sys.argv[1]), eval_llm=sys.argv[2], inputs=inputs())
    except Exception as e:
        raise Exception(f"An error occurred while testing the crew: {{e}}")
"#
    )
}

const ENV_FILE: &str = "# Add your API keys here
OPENAI_API_KEY=your_api_key_here
GEMINI_API_KEY=your_api_key_here
ANTHROPIC_API_KEY=your_api_key_here
";

const CUSTOM_TOOL: &str = r#"from crewai.tools import BaseTool
from typing import Type
from pydantic import BaseModel, Field


class MyCustomToolInput(BaseModel):
    """Input schema for MyCustomTool."""

    argument: str = Field(..., description="Description of the argument.")


class MyCustomTool(BaseTool):
    name: str = "Name of my tool"
    description: str = "What this tool is useful for; the agent reads this to decide when to use it."
    args_schema: Type[BaseModel] = MyCustomToolInput

    def _run(self, argument: str) -> str:
        return "this is an example of a tool output, ignore it and move along."
"#;

const GITIGNORE: &str = "__pycache__/
*.pyc
*.pyo
*.pyd
.Python
env/
venv/
.env
.venv/
pip-log.txt
pip-delete-this-directory.txt
.DS_Store
*.log
dist/
build/
*.egg-info/
";
