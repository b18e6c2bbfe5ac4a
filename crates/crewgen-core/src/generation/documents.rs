//! Agent and task documents.
//!
//! Documents are kept as order-preserving YAML mappings so that a pair reads
//! back exactly as it was produced. The typed views are used to build the
//! fallback documents and to check the shape of model output.

use super::validator::{self, ValidationError};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Personalization tokens that task descriptions carry literally.
///
/// The downstream multi-agent runtime interpolates them at execution time, so
/// nothing in this crate ever substitutes them.
pub const PLACEHOLDERS: [&str; 13] = [
    "{topic}",
    "{recipient_name}",
    "{subject}",
    "{sender_name}",
    "{additional_context}",
    "{project_details}",
    "{requirements}",
    "{target_audience}",
    "{research_scope}",
    "{product_service}",
    "{content_type}",
    "{key_points}",
    "{current_year}",
];

/// Key stripped from every finalized entry.
pub const TOOLS_KEY: &str = "tools";

/// Plain scalars that YAML 1.1 readers resolve to booleans.
const YAML11_BOOLEANS: [&str; 16] = [
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off", "OFF",
];

/// Errors raised while (de)serializing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// YAML could not be read or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not a mapping of named entries.
    #[error("{0} document is not a mapping")]
    NotAMapping(DocumentKind),
}

/// Which half of a pair a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// The agent definition set.
    Agents,
    /// The task definition set.
    Tasks,
}

impl DocumentKind {
    /// File name of the document inside the config directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Agents => "agents.yaml",
            Self::Tasks => "tasks.yaml",
        }
    }

    /// Path of the document relative to the project root.
    #[must_use]
    pub fn relative_path(self, project_name: &str) -> PathBuf {
        PathBuf::from("src").join(project_name).join("config").join(self.file_name())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agents => f.write_str("agents"),
            Self::Tasks => f.write_str("tasks"),
        }
    }
}

/// One agent entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Role the agent plays.
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Background prose.
    pub backstory: String,
    /// Whether the runtime logs the agent's reasoning.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Whether the agent may hand work to other agents.
    #[serde(default)]
    pub allow_delegation: bool,
}

const fn default_verbose() -> bool {
    true
}

impl AgentDefinition {
    pub(crate) fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert("role".into(), self.role.clone().into());
        map.insert("goal".into(), self.goal.clone().into());
        map.insert("backstory".into(), self.backstory.clone().into());
        map.insert("verbose".into(), self.verbose.into());
        map.insert("allow_delegation".into(), self.allow_delegation.into());
        Value::Mapping(map)
    }
}

/// One task entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Instructions for the task, placeholders left literal.
    pub description: String,
    /// Description of the expected result.
    pub expected_output: String,
    /// Name of the agent performing the task.
    pub agent: String,
}

impl TaskDefinition {
    pub(crate) fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert("description".into(), self.description.clone().into());
        map.insert("expected_output".into(), self.expected_output.clone().into());
        map.insert("agent".into(), self.agent.clone().into());
        Value::Mapping(map)
    }
}

/// The two documents as text, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedConfig {
    /// Serialized agents document.
    pub agents_yaml: String,
    /// Serialized tasks document.
    pub tasks_yaml: String,
}

impl RenderedConfig {
    /// Text of one document.
    #[must_use]
    pub fn document(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Agents => &self.agents_yaml,
            DocumentKind::Tasks => &self.tasks_yaml,
        }
    }
}

/// A matched agents/tasks pair.
///
/// Every pair that can be obtained outside this crate has passed the
/// referential check: each task's `agent` names a declared agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPair {
    agents: Mapping,
    tasks: Mapping,
}

impl ConfigPair {
    /// Wraps mappings that have already been validated or were built from
    /// the same archetype names.
    pub(crate) fn from_mappings(agents: Mapping, tasks: Mapping) -> Self {
        Self { agents, tasks }
    }

    pub(crate) fn from_definitions<'a>(
        agents: impl IntoIterator<Item = (&'a str, AgentDefinition)>,
        tasks: impl IntoIterator<Item = (&'a str, TaskDefinition)>,
    ) -> Self {
        let agents = agents.into_iter().map(|(name, def)| (name.into(), def.to_value())).collect();
        let tasks = tasks.into_iter().map(|(name, def)| (name.into(), def.to_value())).collect();
        Self { agents, tasks }
    }

    /// Reads a rendered pair back, applying the full validation gate.
    pub fn parse(rendered: &RenderedConfig) -> Result<Self, ValidationError> {
        validator::validate(&rendered.agents_yaml, &rendered.tasks_yaml)
    }

    /// Agent names in declaration order.
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().filter_map(Value::as_str).collect()
    }

    /// Task names in declaration order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().filter_map(Value::as_str).collect()
    }

    /// The agent referenced by each task, in task order.
    pub fn agent_refs(&self) -> Vec<&str> {
        self.tasks.values().filter_map(|task| task.get("agent").and_then(Value::as_str)).collect()
    }

    /// Typed view of one agent.
    pub fn agent(&self, name: &str) -> Option<AgentDefinition> {
        self.agents.get(name).and_then(|value| serde_yaml::from_value(value.clone()).ok())
    }

    /// Typed view of one task.
    pub fn task(&self, name: &str) -> Option<TaskDefinition> {
        self.tasks.get(name).and_then(|value| serde_yaml::from_value(value.clone()).ok())
    }

    /// Whether every task references a declared agent.
    pub fn is_consistent(&self) -> bool {
        validator::undeclared_agents(&self.agents, &self.tasks).is_empty()
    }

    /// The raw agents mapping.
    pub fn agents(&self) -> &Mapping {
        &self.agents
    }

    /// The raw tasks mapping.
    pub fn tasks(&self) -> &Mapping {
        &self.tasks
    }

    pub(crate) fn documents_mut(&mut self) -> [&mut Mapping; 2] {
        [&mut self.agents, &mut self.tasks]
    }

    /// Serializes both documents in block style, keys in insertion order.
    pub fn render(&self) -> Result<RenderedConfig, DocumentError> {
        Ok(RenderedConfig {
            agents_yaml: emit(&self.agents)?,
            tasks_yaml: emit(&self.tasks)?,
        })
    }
}

/// Serializes a document so that YAML 1.1 readers see the same scalars.
///
/// serde_yaml leaves `yes`, `no`, `on`, `off` and friends unquoted because
/// YAML 1.2 reads them as strings; the downstream runtime reads YAML 1.1.
pub(crate) fn emit(document: &Mapping) -> Result<String, DocumentError> {
    Ok(quote_yaml11_booleans(&serde_yaml::to_string(document)?))
}

fn quote_yaml11_booleans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Indent of the line that opened the current block scalar.
    let mut block_indent = None;

    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches('\n');
        let indent = body.len() - body.trim_start().len();

        if let Some(parent) = block_indent {
            if body.trim().is_empty() || indent > parent {
                out.push_str(line);
                continue;
            }
            block_indent = None;
        }

        let (rewritten, opens_block) = quote_line(body);
        if opens_block {
            block_indent = Some(indent);
        }
        out.push_str(&rewritten);
        out.push_str(&line[body.len()..]);
    }

    out
}

/// Quotes the key, value or sequence item of one block-style line.
///
/// Returns the line and whether it opens a block scalar.
fn quote_line(line: &str) -> (String, bool) {
    let mut rest = line.trim_start();
    let mut is_item = false;
    while let Some(item) = rest.strip_prefix("- ") {
        rest = item;
        is_item = true;
    }
    let prefix = &line[..line.len() - rest.len()];

    if rest.starts_with(['\'', '"']) {
        return (line.to_string(), false);
    }

    let quote = |scalar: &str| {
        if YAML11_BOOLEANS.contains(&scalar) { format!("'{scalar}'") } else { scalar.to_string() }
    };
    let opens_block = |scalar: &str| scalar.starts_with(['|', '>']);

    match rest.split_once(": ") {
        Some((key, value)) => (format!("{prefix}{}: {}", quote(key), quote(value)), opens_block(value)),
        None => match rest.strip_suffix(':') {
            Some(key) => (format!("{prefix}{}:", quote(key)), false),
            // Bare lines outside sequences continue a multi-line plain scalar.
            None if is_item => (format!("{prefix}{}", quote(rest)), opens_block(rest)),
            None => (line.to_string(), false),
        },
    }
}
