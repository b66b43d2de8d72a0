use tracing::{debug, warn};

use switchboard_core::{AgentDefinition, Forbidden, ToolCapability, ToolSet};

/// Enforces declared tool allowlists plus a host-wide denylist.
///
/// Stateless apart from the denylist, so every check is idempotent and the
/// guard can be shared freely across tasks.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    denied: ToolSet,
}

impl AccessGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse `denied` for every definition, whatever it declares.
    pub fn with_denied(mut self, denied: ToolSet) -> Self {
        self.denied = denied;
        self
    }

    pub fn denied(&self) -> &ToolSet {
        &self.denied
    }

    /// Permit `requested` only if every tool is declared by `definition`
    /// and none is on the denylist.
    ///
    /// On refusal the error lists exactly the offending tools.
    pub fn authorize(&self, definition: &AgentDefinition, requested: &ToolSet) -> Result<(), Forbidden> {
        let missing: ToolSet = requested
            .iter()
            .filter(|tool| !definition.allowed_tools().contains(*tool) || self.denied.contains(*tool))
            .collect();

        if missing.is_empty() {
            debug!(definition = %definition.id(), tools = %requested, "tool access granted");
            return Ok(());
        }

        warn!(
            definition = %definition.id(),
            missing = %missing,
            declared = %definition.allowed_tools(),
            "tool access denied"
        );
        Err(Forbidden {
            definition: definition.id().clone(),
            missing,
        })
    }

    /// Single-tool form of [`AccessGuard::authorize`].
    pub fn authorize_invocation(&self, definition: &AgentDefinition, tool: ToolCapability) -> Result<(), Forbidden> {
        self.authorize(definition, &ToolSet::from([tool]))
    }
}
