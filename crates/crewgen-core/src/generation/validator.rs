//! Acceptance gate for candidate document pairs.
//!
//! A pair passes when both documents are non-empty mappings of well-formed
//! entries and every task's `agent` names a declared agent.

use super::documents::{AgentDefinition, ConfigPair, DocumentKind, TaskDefinition};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Why a candidate pair was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A document is not valid YAML or does not have the expected shape.
    #[error("invalid {document} document: {reason}")]
    Structural {
        /// The offending document.
        document: DocumentKind,
        /// What was wrong with it.
        reason: String,
    },

    /// Tasks reference agents the agents document does not declare.
    #[error("tasks reference undeclared agents: {}", missing.join(", "))]
    Referential {
        /// Undeclared agent names, in order of first reference.
        missing: Vec<String>,
    },
}

impl ValidationError {
    fn structural(document: DocumentKind, reason: impl Into<String>) -> Self {
        Self::Structural { document, reason: reason.into() }
    }
}

/// Validates a candidate pair and wraps it on success.
pub fn validate(agents_yaml: &str, tasks_yaml: &str) -> Result<ConfigPair, ValidationError> {
    let agents = parse_document::<AgentDefinition>(agents_yaml, DocumentKind::Agents)?;
    let tasks = parse_document::<TaskDefinition>(tasks_yaml, DocumentKind::Tasks)?;

    let missing = undeclared_agents(&agents, &tasks);
    if !missing.is_empty() {
        return Err(ValidationError::Referential { missing });
    }

    Ok(ConfigPair::from_mappings(agents, tasks))
}

/// Agent names referenced by `tasks` but not declared in `agents`.
pub(crate) fn undeclared_agents(agents: &Mapping, tasks: &Mapping) -> Vec<String> {
    let declared: HashSet<&str> = agents.keys().filter_map(Value::as_str).collect();
    let mut missing: Vec<String> = Vec::new();

    for task in tasks.values() {
        let reference = task.get("agent").and_then(Value::as_str).unwrap_or_default();
        if !declared.contains(reference) && !missing.iter().any(|m| m == reference) {
            missing.push(reference.to_string());
        }
    }

    missing
}

fn parse_document<T: DeserializeOwned>(
    text: &str,
    kind: DocumentKind,
) -> Result<Mapping, ValidationError> {
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| ValidationError::structural(kind, e.to_string()))?;

    let Value::Mapping(mapping) = value else {
        return Err(ValidationError::structural(kind, "expected a mapping of named entries"));
    };
    if mapping.is_empty() {
        return Err(ValidationError::structural(kind, "document declares no entries"));
    }

    for (key, entry) in &mapping {
        let Some(name) = key.as_str() else {
            return Err(ValidationError::structural(kind, format!("non-string key {key:?}")));
        };
        serde_yaml::from_value::<T>(entry.clone())
            .map_err(|e| ValidationError::structural(kind, format!("entry '{name}': {e}")))?;
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENTS: &str = r"
researcher:
  role: Researcher
  goal: Find things
  backstory: Curious
  verbose: true
  allow_delegation: true
analyst:
  role: Analyst
  goal: Explain things
  backstory: Careful
";

    const TASKS: &str = r"
research_task:
  description: Research {topic}
  expected_output: Notes
  agent: researcher
analysis_task:
  description: Analyze for {target_audience}
  expected_output: Report
  agent: analyst
";

    #[test]
    fn test_valid_pair_is_accepted() {
        let pair = validate(AGENTS, TASKS).unwrap();
        assert_eq!(pair.agent_names(), vec!["researcher", "analyst"]);
        assert_eq!(pair.agent_refs(), vec!["researcher", "analyst"]);
        assert!(!pair.agent("analyst").unwrap().allow_delegation);
    }

    #[test]
    fn test_undeclared_agent_is_rejected() {
        let tasks = TASKS.replace("agent: analyst", "agent: editor");
        let err = validate(AGENTS, &tasks).unwrap_err();
        assert_eq!(err, ValidationError::Referential { missing: vec!["editor".to_string()] });
    }

    #[test]
    fn test_missing_references_are_reported_once() {
        let tasks = TASKS.replace("agent: analyst", "agent: ghost").replace("agent: researcher", "agent: ghost");
        let err = validate(AGENTS, &tasks).unwrap_err();
        assert_eq!(err, ValidationError::Referential { missing: vec!["ghost".to_string()] });
    }

    #[test]
    fn test_malformed_yaml_is_structural() {
        let err = validate("researcher: [unclosed", TASKS).unwrap_err();
        assert!(matches!(err, ValidationError::Structural { document: DocumentKind::Agents, .. }));
    }

    #[test]
    fn test_non_mapping_and_empty_documents_are_structural() {
        let err = validate("- a\n- b\n", TASKS).unwrap_err();
        assert!(matches!(err, ValidationError::Structural { document: DocumentKind::Agents, .. }));

        let err = validate(AGENTS, "{}").unwrap_err();
        assert!(matches!(err, ValidationError::Structural { document: DocumentKind::Tasks, .. }));
    }

    #[test]
    fn test_task_without_agent_is_structural() {
        let tasks = "research_task:\n  description: x\n  expected_output: y\n";
        let err = validate(AGENTS, tasks).unwrap_err();
        match err {
            ValidationError::Structural { document, reason } => {
                assert_eq!(document, DocumentKind::Tasks);
                assert!(reason.contains("research_task"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_agent_missing_prose_is_structural() {
        let agents = "researcher:\n  role: Researcher\n";
        let err = validate(agents, TASKS).unwrap_err();
        assert!(matches!(err, ValidationError::Structural { document: DocumentKind::Agents, .. }));
    }
}
