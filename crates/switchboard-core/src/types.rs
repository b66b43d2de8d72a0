use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::ParseError;
use crate::tool::ToolSet;

/// The declared name of a definition. Case-sensitive and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DefinitionId(String);

impl DefinitionId {
    /// Build an id from a declared name. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> std::result::Result<Self, ParseError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::MissingId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DefinitionId {
    type Error = ParseError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DefinitionId> for String {
    fn from(id: DefinitionId) -> Self {
        id.0
    }
}

impl Borrow<str> for DefinitionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DefinitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque model-class tag (e.g. `fast`, `capable`). Never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelTier(String);

impl ModelTier {
    /// The tier assigned when a definition declares none and nothing else
    /// is configured.
    pub const DEFAULT_FALLBACK: &'static str = "default";

    /// Returns `None` for an empty or whitespace-only tag.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModelTier {
    type Error = &'static str;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value).ok_or("model tier must not be empty")
    }
}

impl From<ModelTier> for String {
    fn from(tier: ModelTier) -> Self {
        tier.0
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self(Self::DEFAULT_FALLBACK.to_string())
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What sort of definition a source holds. Metadata only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    #[default]
    Agent,
    Command,
    Skill,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Skill => "skill",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registry load does with a source that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidPolicy {
    /// Fail the whole load.
    #[default]
    Abort,
    /// Log the source, record it as skipped and keep loading.
    Skip,
}

/// One routing request from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Free-text statement of what the user wants.
    pub intent: String,
    /// Tools the selected definition must be allowed to use.
    #[serde(default)]
    pub required_tools: ToolSet,
    /// Tier that earns the tie-break bonus when a definition declares it.
    #[serde(default)]
    pub preferred_model_tier: Option<ModelTier>,
}

impl MatchRequest {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            ..Self::default()
        }
    }

    pub fn with_required_tools(mut self, tools: impl Into<ToolSet>) -> Self {
        self.required_tools = tools.into();
        self
    }

    pub fn with_preferred_tier(mut self, tier: ModelTier) -> Self {
        self.preferred_model_tier = Some(tier);
        self
    }
}

impl fmt::Display for MatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent '{}'", self.intent)?;
        if !self.required_tools.is_empty() {
            write!(f, ", requiring [{}]", self.required_tools)?;
        }
        if let Some(tier) = &self.preferred_model_tier {
            write!(f, ", preferring tier '{tier}'")?;
        }
        Ok(())
    }
}
