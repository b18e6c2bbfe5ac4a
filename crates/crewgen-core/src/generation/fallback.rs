//! Deterministic, keyword-driven document pair.
//!
//! Used whenever the model path cannot produce an accepted pair. Both
//! documents are declared from the same archetype names, so every pair built
//! here is consistent by construction.

use super::documents::{AgentDefinition, ConfigPair, TaskDefinition, PLACEHOLDERS};
use std::fmt::Write;

/// Agent and task names selected for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetypes {
    /// Agent that analyzes the inputs.
    pub analyst: &'static str,
    /// Agent that produces the deliverable.
    pub creator: &'static str,
    /// Task performed by `analyst`.
    pub analysis_task: &'static str,
    /// Task performed by `creator`.
    pub creation_task: &'static str,
}

impl Archetypes {
    const fn new(
        analyst: &'static str,
        creator: &'static str,
        analysis_task: &'static str,
        creation_task: &'static str,
    ) -> Self {
        Self { analyst, creator, analysis_task, creation_task }
    }
}

/// Domain keywords in priority order; the first one found in the topic wins.
pub const DOMAINS: [(&str, Archetypes); 6] = [
    (
        "email",
        Archetypes::new("content_analyzer", "email_composer", "analyze_content_task", "compose_email_task"),
    ),
    ("research", Archetypes::new("researcher", "analyst", "research_task", "analysis_task")),
    ("development", Archetypes::new("developer", "tester", "development_task", "testing_task")),
    (
        "marketing",
        Archetypes::new("marketer", "strategist", "market_analysis_task", "strategy_task"),
    ),
    (
        "data",
        Archetypes::new("data_scientist", "analyst", "data_collection_task", "data_analysis_task"),
    ),
    ("content", Archetypes::new("content_creator", "editor", "content_creation_task", "editing_task")),
];

/// Archetypes used when no domain keyword matches.
pub const GENERIC: Archetypes =
    Archetypes::new("content_analyzer", "content_creator", "analyze_content_task", "create_content_task");

/// How the deliverable task should use each input.
const INPUT_USAGE: [(&str, &str); 11] = [
    ("{recipient_name}", "address the deliverable to them"),
    ("{subject}", "use as the subject line or title"),
    ("{sender_name}", "sign or attribute the deliverable"),
    ("{additional_context}", "work into the main content"),
    ("{project_details}", "follow the project specifics"),
    ("{requirements}", "meet every requirement"),
    ("{target_audience}", "tailor tone and depth"),
    ("{research_scope}", "keep the research focused"),
    ("{product_service}", "feature it in the content"),
    ("{content_type}", "format the output accordingly"),
    ("{key_points}", "cover each point"),
];

/// Picks the archetypes for a topic.
pub fn archetypes_for(topic: &str) -> Archetypes {
    let topic = topic.to_lowercase();
    DOMAINS
        .iter()
        .find(|(keyword, _)| topic.contains(keyword))
        .map_or(GENERIC, |(_, archetypes)| *archetypes)
}

/// Builds the fallback pair for a topic. Never fails.
pub fn generate(topic: &str) -> ConfigPair {
    let names = archetypes_for(topic);
    let analyst_title = title(names.analyst);
    let creator_title = title(names.creator);

    let analyst = AgentDefinition {
        role: format!("{topic} {analyst_title}"),
        goal: format!("Analyze and extract the key information in the provided content about {topic}"),
        backstory: format!(
            "You are a seasoned {} focused on {topic}. You quickly pick out the details, \
             context and requirements in any material so the deliverable can be built on \
             solid ground.",
            analyst_title.to_lowercase()
        ),
        verbose: true,
        allow_delegation: true,
    };

    let creator = AgentDefinition {
        role: format!("{topic} {creator_title}"),
        goal: format!("Produce polished, well-structured content about {topic} from the analysis"),
        backstory: format!(
            "You are an experienced {} working on {topic}. You turn analyzed information into \
             professional deliverables that meet their requirements and read well.",
            creator_title.to_lowercase()
        ),
        verbose: true,
        allow_delegation: false,
    };

    let analysis = TaskDefinition {
        description: analysis_description(),
        expected_output: "An analysis that lists every user-provided input and a concrete plan \
                          for using each of them in the final deliverable."
            .to_string(),
        agent: names.analyst.to_string(),
    };

    let creation = TaskDefinition {
        description: creation_description(),
        expected_output: "A complete, professional deliverable personalized with the actual \
                          user inputs and ready to use as is."
            .to_string(),
        agent: names.creator.to_string(),
    };

    ConfigPair::from_definitions(
        [(names.analyst, analyst), (names.creator, creator)],
        [(names.analysis_task, analysis), (names.creation_task, creation)],
    )
}

/// "data_scientist" becomes "Data Scientist".
fn title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn analysis_description() -> String {
    let inputs: Vec<&str> = PLACEHOLDERS
        .iter()
        .copied()
        .filter(|p| *p != "{topic}" && *p != "{current_year}")
        .collect();

    format!(
        "Analyze the topic \"{{topic}}\" and every input the user supplied, such as {}.\n\
         Work out the purpose, requirements and approach for the deliverable, paying close \
         attention to personalization details.\n\
         Current year: {{current_year}}",
        inputs.join(", ")
    )
}

fn creation_description() -> String {
    let mut description = String::from(
        "Create the final deliverable for \"{topic}\" from the previous analysis.\n\
         Use every input the user provided:\n",
    );
    for (placeholder, usage) in INPUT_USAGE {
        let _ = writeln!(description, "- {placeholder}: {usage}");
    }
    description.push_str(
        "The result must carry the user's actual data rather than generic examples.\n\
         Current year: {current_year}",
    );
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_priority() {
        assert_eq!(archetypes_for("Market research on electric vehicles").analyst, "researcher");
        assert_eq!(archetypes_for("Email campaign research").analyst, "content_analyzer");
        assert_eq!(archetypes_for("Email campaign research").creator, "email_composer");
        assert_eq!(archetypes_for("Data pipeline DEVELOPMENT").analyst, "developer");
        assert_eq!(archetypes_for("Content marketing plan").analyst, "marketer");
        assert_eq!(archetypes_for("Big DATA dashboard").analyst, "data_scientist");
        assert_eq!(archetypes_for("Blog content").creator, "editor");
    }

    #[test]
    fn test_generic_archetypes() {
        assert_eq!(archetypes_for("Wedding toast"), GENERIC);
        assert_eq!(archetypes_for(""), GENERIC);
    }

    #[test]
    fn test_pair_shape() {
        let pair = generate("Market research on electric vehicles");
        assert_eq!(pair.agent_names(), vec!["researcher", "analyst"]);
        assert_eq!(pair.task_names(), vec!["research_task", "analysis_task"]);
        assert_eq!(pair.agent_refs(), vec!["researcher", "analyst"]);

        let researcher = pair.agent("researcher").unwrap();
        assert_eq!(researcher.role, "Market research on electric vehicles Researcher");
        assert!(researcher.backstory.starts_with("You are a seasoned researcher focused on"));
        assert!(researcher.allow_delegation);

        let analyst = pair.agent("analyst").unwrap();
        assert_eq!(analyst.role, "Market research on electric vehicles Analyst");
        assert!(!analyst.allow_delegation);
    }

    #[test]
    fn test_roles_follow_archetypes() {
        let pair = generate("Big data dashboard");
        assert_eq!(pair.agent("data_scientist").unwrap().role, "Big data dashboard Data Scientist");

        let pair = generate("Wedding toast");
        assert_eq!(pair.agent("content_analyzer").unwrap().role, "Wedding toast Content Analyzer");
        assert_eq!(pair.agent("content_creator").unwrap().role, "Wedding toast Content Creator");
    }

    #[test]
    fn test_placeholders_stay_literal() {
        let pair = generate("Newsletter");
        let first = pair.task("analyze_content_task").unwrap().description;
        let second = pair.task("create_content_task").unwrap().description;
        for placeholder in PLACEHOLDERS {
            assert!(first.contains(placeholder), "analysis task lacks {placeholder}");
            assert!(second.contains(placeholder), "creation task lacks {placeholder}");
        }
    }

    #[test]
    fn test_every_topic_yields_consistent_renderable_pair() {
        let topics = [
            "",
            "plain",
            "colon: inside",
            "quote \" and 'single'",
            "multi\nline topic",
            "- looks like a list",
            "{braces} & [brackets] # hash",
            "données électroniques",
        ];
        for topic in topics {
            let pair = generate(topic);
            assert!(pair.is_consistent(), "inconsistent pair for {topic:?}");
            let parsed = ConfigPair::parse(&pair.render().unwrap()).unwrap();
            assert_eq!(parsed, pair, "round trip changed pair for {topic:?}");
        }
    }
}
