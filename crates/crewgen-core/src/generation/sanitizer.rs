//! Removal of disallowed fields.
//!
//! Tool wiring belongs to the scaffolding step, so no finalized entry carries
//! a `tools` key. Canonical serialization is [`ConfigPair::render`].

use super::documents::{self, ConfigPair, DocumentError, DocumentKind, TOOLS_KEY};
use serde_yaml::{Mapping, Value};

/// Strips `tools` from every entry of both documents.
pub fn sanitize(mut pair: ConfigPair) -> ConfigPair {
    for document in pair.documents_mut() {
        strip_tools(document);
    }
    pair
}

/// Sanitizes one serialized document and re-serializes it.
///
/// Key order is kept; output is block style. Applying it to its own output
/// returns the same text.
pub fn sanitize_document(text: &str, kind: DocumentKind) -> Result<String, DocumentError> {
    let value: Value = serde_yaml::from_str(text)?;
    let Value::Mapping(mut mapping) = value else {
        return Err(DocumentError::NotAMapping(kind));
    };
    strip_tools(&mut mapping);
    documents::emit(&mapping)
}

fn strip_tools(document: &mut Mapping) {
    for entry in document.values_mut() {
        if let Value::Mapping(fields) = entry {
            if fields.contains_key(TOOLS_KEY) {
                *fields = std::mem::take(fields)
                    .into_iter()
                    .filter(|(key, _)| key.as_str() != Some(TOOLS_KEY))
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::validator;

    const AGENTS: &str = r"
writer:
  role: Writer
  tools:
    - search
  goal: Write
  backstory: Writes
  verbose: true
  allow_delegation: false
editor:
  role: Editor
  goal: Edit
  backstory: Edits
  tools: []
";

    const TASKS: &str = r"
write_task:
  description: Draft for {recipient_name}
  expected_output: Draft
  agent: writer
  tools: [search]
edit_task:
  description: Edit
  expected_output: Final
  agent: editor
";

    #[test]
    fn test_sanitize_pair_removes_tools_everywhere() {
        let pair = sanitize(validator::validate(AGENTS, TASKS).unwrap());
        let rendered = pair.render().unwrap();
        assert!(!rendered.agents_yaml.contains("tools"));
        assert!(!rendered.tasks_yaml.contains("tools"));
        assert!(pair.is_consistent());
    }

    #[test]
    fn test_sanitize_keeps_field_order() {
        let text = sanitize_document(AGENTS, DocumentKind::Agents).unwrap();
        let role = text.find("role:").unwrap();
        let goal = text.find("goal:").unwrap();
        let backstory = text.find("backstory:").unwrap();
        assert!(role < goal && goal < backstory);
        assert!(text.find("writer:").unwrap() < text.find("editor:").unwrap());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_document(AGENTS, DocumentKind::Agents).unwrap();
        let twice = sanitize_document(&once, DocumentKind::Agents).unwrap();
        assert_eq!(once, twice);

        let pair = sanitize(validator::validate(AGENTS, TASKS).unwrap());
        assert_eq!(sanitize(pair.clone()), pair);
    }

    #[test]
    fn test_sanitize_uses_block_style() {
        let text = sanitize_document("a:\n  role: {x: 1}\n  list: [1, 2]\n", DocumentKind::Agents).unwrap();
        assert!(!text.contains('{'));
        assert!(!text.contains('['));
        assert!(text.contains("- 1"));
    }

    #[test]
    fn test_sanitize_rejects_non_mapping() {
        let err = sanitize_document("- a\n", DocumentKind::Tasks).unwrap_err();
        assert!(matches!(err, DocumentError::NotAMapping(DocumentKind::Tasks)));
    }
}
