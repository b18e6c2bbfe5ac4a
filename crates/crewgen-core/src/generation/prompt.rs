//! Instruction sent to the language model.

use super::documents::PLACEHOLDERS;
use super::parser::{AGENTS_MARKER, TASKS_MARKER};

/// Builds the single instruction asking for both documents at once.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Renders the instruction for `topic`.
    ///
    /// The output only varies with its two inputs.
    pub fn build(topic: &str, current_year: i32) -> String {
        let placeholders = PLACEHOLDERS.join(", ");

        format!(
            r#"You are an expert CrewAI configuration generator. Create both agents.yaml and tasks.yaml files for the project: "{topic}"

REQUIREMENTS:
1. Declare exactly 2 agents and give them consistent, descriptive names.
2. Use snake_case identifiers for every agent and task name.
3. Declare exactly 2 tasks; each task's `agent` field must use one of the exact agent names declared above.
4. The tasks run sequentially: the first agent analyzes, the second agent produces the final content.
5. Do NOT include a `tools` field anywhere.
6. Task descriptions must reference the user inputs as literal placeholders, never filled in: {placeholders}.

Every agent has: role, goal, backstory, verbose, allow_delegation.
Every task has: description, expected_output, agent.

Answer in exactly this layout:

{AGENTS_MARKER}
first_agent_name:
  role: >
    ...
  goal: >
    ...
  backstory: >
    ...
  verbose: true
  allow_delegation: true
second_agent_name:
  role: >
    ...
  goal: >
    ...
  backstory: >
    ...
  verbose: true
  allow_delegation: false

{TASKS_MARKER}
first_task_name:
  description: >
    ... {{topic}} ... {{additional_context}} ... Current year: {{current_year}}
  expected_output: >
    ...
  agent: first_agent_name
second_task_name:
  description: >
    ... {{recipient_name}} ... {{subject}} ... {{sender_name}} ...
  expected_output: >
    ...
  agent: second_agent_name

IMPORTANT: Output only the two YAML documents separated by the marker lines above. No explanations, no code fences.
CRITICAL: The agent names used in tasks.yaml must match the agent names in agents.yaml exactly.

Current year: {current_year}
Topic: {topic}
"#
        )
    }
}
