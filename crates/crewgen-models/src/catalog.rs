//! Provider catalog.
//!
//! A fixed, read-only capability table describing every provider a caller may
//! select, the models it advertises and the credential it needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a provider identifier is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Closed set of selectable providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini.
    Gemini,
    /// OpenAI GPT.
    OpenAI,
    /// Anthropic Claude.
    Anthropic,
}

impl ProviderKind {
    /// Every provider, in catalog order.
    pub const ALL: [Self; 3] = [Self::Gemini, Self::OpenAI, Self::Anthropic];

    /// Stable identifier used on the request surface.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// The catalog entry for this provider.
    #[must_use]
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            Self::Gemini => &PROVIDERS[0],
            Self::OpenAI => &PROVIDERS[1],
            Self::Anthropic => &PROVIDERS[2],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Static registry entry for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSpec {
    /// Provider identifier.
    pub kind: ProviderKind,
    /// Human-readable provider name.
    pub display_name: &'static str,
    /// Model identifiers offered for selection.
    pub models: &'static [&'static str],
    /// Name of the configuration value holding the credential.
    pub credential_env: &'static str,
}

static PROVIDERS: [ProviderSpec; 3] = [
    ProviderSpec {
        kind: ProviderKind::Gemini,
        display_name: "Google Gemini",
        models: &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro"],
        credential_env: "GEMINI_API_KEY",
    },
    ProviderSpec {
        kind: ProviderKind::OpenAI,
        display_name: "OpenAI GPT",
        models: &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"],
        credential_env: "OPENAI_API_KEY",
    },
    ProviderSpec {
        kind: ProviderKind::Anthropic,
        display_name: "Anthropic Claude",
        models: &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
        credential_env: "ANTHROPIC_API_KEY",
    },
];

impl ProviderSpec {
    /// All catalog entries.
    #[must_use]
    pub fn all() -> &'static [ProviderSpec] {
        &PROVIDERS
    }

    /// The entry for a provider.
    #[must_use]
    pub fn get(kind: ProviderKind) -> &'static ProviderSpec {
        kind.spec()
    }

    /// Looks an entry up by its string identifier.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static ProviderSpec> {
        id.parse::<ProviderKind>().ok().map(ProviderKind::spec)
    }

    /// Whether the provider advertises the given model.
    #[must_use]
    pub fn supports(&self, model_id: &str) -> bool {
        self.models.contains(&model_id)
    }
}

/// Models advertised by a provider id; unknown ids yield an empty list.
#[must_use]
pub fn models_for(provider_id: &str) -> &'static [&'static str] {
    ProviderSpec::find(provider_id).map_or(&[], |spec| spec.models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("Gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("OPENAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAI));
        assert_eq!("anthropic".parse::<ProviderKind>(), Ok(ProviderKind::Anthropic));
        assert_eq!("claude".parse::<ProviderKind>(), Ok(ProviderKind::Anthropic));
        assert_eq!(
            "mistral".parse::<ProviderKind>(),
            Err(UnknownProvider("mistral".to_string()))
        );
    }

    #[test]
    fn test_catalog_is_indexed_by_kind() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.spec().kind, kind);
        }
        assert_eq!(ProviderSpec::all().len(), 3);
    }

    #[test]
    fn test_credential_names() {
        assert_eq!(ProviderSpec::get(ProviderKind::Gemini).credential_env, "GEMINI_API_KEY");
        assert_eq!(ProviderSpec::get(ProviderKind::OpenAI).credential_env, "OPENAI_API_KEY");
        assert_eq!(ProviderSpec::get(ProviderKind::Anthropic).credential_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_models_for() {
        assert_eq!(models_for("gemini"), &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro"]);
        assert!(models_for("unknown").is_empty());
        assert!(ProviderSpec::get(ProviderKind::OpenAI).supports("gpt-4"));
        assert!(!ProviderSpec::get(ProviderKind::OpenAI).supports("gemini-1.5-pro"));
    }
}
