//! Splits a raw model response into candidate agents and tasks documents.

use thiserror::Error;

/// Label that may precede the agents document.
pub const AGENTS_MARKER: &str = "--- agents.yaml ---";

/// Boundary between the agents and tasks documents.
pub const TASKS_MARKER: &str = "--- tasks.yaml ---";

const FENCE: &str = "```";

/// Why a response could not be split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but whitespace after removing code fences.
    #[error("model response is empty")]
    Empty,

    /// Neither the marker nor a task header was found.
    #[error("no boundary between agents and tasks documents")]
    NoBoundary,
}

/// Unvalidated document texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
    /// Agents document text.
    pub agents_yaml: String,
    /// Tasks document text.
    pub tasks_yaml: String,
}

/// Parser for two-document model responses.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a response.
    ///
    /// Code fences are stripped first. The fixed tasks marker is preferred;
    /// when it does not split the text in exactly two, the first top-level
    /// line that ends with `:` and mentions a task is used as the boundary.
    pub fn parse(raw: &str) -> Result<CandidatePair, ParseError> {
        let body = Self::strip_code_fences(raw);
        if body.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(pair) = Self::split_on_marker(&body) {
            return Ok(pair);
        }

        Self::split_on_task_header(&body).ok_or(ParseError::NoBoundary)
    }

    /// Keeps fenced content plus any marker lines outside the fences.
    ///
    /// A response without fences is returned unchanged. A fence line's info
    /// string (`yaml`, `yml`) is dropped with it.
    fn strip_code_fences(raw: &str) -> String {
        if !raw.contains(FENCE) {
            return raw.to_string();
        }

        let mut inside = false;
        let mut kept = Vec::new();
        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with(FENCE) {
                inside = !inside;
                continue;
            }
            if inside || trimmed == AGENTS_MARKER || trimmed == TASKS_MARKER {
                kept.push(line);
            }
        }
        kept.join("\n")
    }

    fn split_on_marker(body: &str) -> Option<CandidatePair> {
        let parts: Vec<&str> = body.split(TASKS_MARKER).collect();
        if parts.len() != 2 {
            return None;
        }

        Some(CandidatePair {
            agents_yaml: parts[0].replace(AGENTS_MARKER, "").trim().to_string(),
            tasks_yaml: parts[1].trim().to_string(),
        })
    }

    fn split_on_task_header(body: &str) -> Option<CandidatePair> {
        let lines: Vec<&str> = body.lines().collect();
        let boundary = lines.iter().position(|line| {
            let trimmed = line.trim_end();
            !line.starts_with(char::is_whitespace)
                && trimmed.ends_with(':')
                && trimmed.to_lowercase().contains("task")
        })?;

        let agents = lines[..boundary].join("\n").replace(AGENTS_MARKER, "");
        let agents = agents.trim();
        if agents.is_empty() {
            return None;
        }

        Some(CandidatePair {
            agents_yaml: agents.to_string(),
            tasks_yaml: lines[boundary..].join("\n").trim().to_string(),
        })
    }
}
