use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::tool::ToolSet;
use crate::types::{DefinitionId, DefinitionKind, ModelTier};

/// The prompt body of a definition.
///
/// The router never looks inside it; it is handed back to the host as-is.
/// Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct DefinitionBody(Arc<str>);

impl DefinitionBody {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DefinitionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefinitionBody({} bytes)", self.0.len())
    }
}

impl Serialize for DefinitionBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A validated agent, command or skill definition.
///
/// Built once by the parser and never mutated afterwards; registries share
/// it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    id: DefinitionId,
    kind: DefinitionKind,
    trigger_description: String,
    allowed_tools: ToolSet,
    model_tier: ModelTier,
    /// Header fields the router does not recognize, kept for the host.
    metadata: BTreeMap<String, String>,
    /// Path or label of the source this definition was parsed from.
    origin: String,
    body: DefinitionBody,
}

impl AgentDefinition {
    pub fn new(
        id: DefinitionId,
        trigger_description: impl Into<String>,
        allowed_tools: ToolSet,
        model_tier: ModelTier,
        body: DefinitionBody,
    ) -> Self {
        Self {
            id,
            kind: DefinitionKind::default(),
            trigger_description: trigger_description.into(),
            allowed_tools,
            model_tier,
            metadata: BTreeMap::new(),
            origin: String::new(),
            body,
        }
    }

    pub fn with_kind(mut self, kind: DefinitionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &DefinitionId {
        &self.id
    }

    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    pub fn trigger_description(&self) -> &str {
        &self.trigger_description
    }

    pub fn allowed_tools(&self) -> &ToolSet {
        &self.allowed_tools
    }

    pub fn model_tier(&self) -> &ModelTier {
        &self.model_tier
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn body(&self) -> &DefinitionBody {
        &self.body
    }
}
