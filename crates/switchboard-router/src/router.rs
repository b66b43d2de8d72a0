use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    AgentDefinition, Forbidden, LoadError, MatchRequest, ModelTier, Result, RoutingError, ToolSet,
};
use switchboard_definitions::{LoadOptions, ParseOptions};
use switchboard_guard::AccessGuard;
use switchboard_matcher::{MatchOutcome, MatchPolicy, Matcher};

use crate::live::LiveRegistry;

/// Invoker facade: registry lookup, matching and tool authorization.
///
/// Cheap to share behind an `Arc`; every call works on the registry
/// snapshot current at the moment it starts.
pub struct Router {
    live: Arc<LiveRegistry>,
    matcher: Matcher,
    guard: AccessGuard,
}

impl Router {
    pub fn new(live: Arc<LiveRegistry>, matcher: Matcher, guard: AccessGuard) -> Self {
        Self { live, matcher, guard }
    }

    /// Load the configured directories and build a router with the
    /// configured policy and denylist.
    pub async fn from_config(config: &SwitchboardConfig) -> std::result::Result<Self, LoadError> {
        let live = LiveRegistry::load(load_options(config), config.definitions.dirs.clone()).await?;
        let policy = MatchPolicy {
            min_score: config.matching.min_score,
            tie_epsilon: config.matching.tie_epsilon,
            tier_bonus: config.matching.tier_bonus,
        };
        let matcher = Matcher::new(Arc::new(switchboard_matcher::TokenOverlapScorer), policy);
        let guard = AccessGuard::new().with_denied(config.guard.denied_tool_set());
        info!(
            definitions = live.snapshot().len(),
            scorer = matcher.scorer_name(),
            denied = %guard.denied(),
            "router ready"
        );
        Ok(Self::new(Arc::new(live), matcher, guard))
    }

    /// The best definition for `request`.
    ///
    /// Tools are not pre-authorized; the host must still call
    /// [`Router::authorize`] before each invocation.
    pub async fn resolve(&self, request: &MatchRequest) -> std::result::Result<Arc<AgentDefinition>, RoutingError> {
        self.resolve_with_cancel(request, &CancellationToken::new()).await
    }

    pub async fn resolve_with_cancel(
        &self,
        request: &MatchRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<Arc<AgentDefinition>, RoutingError> {
        self.explain_with_cancel(request, cancel)
            .await
            .map(|outcome| outcome.winner)
    }

    /// The full ranking behind [`Router::resolve`].
    pub async fn explain(&self, request: &MatchRequest) -> std::result::Result<MatchOutcome, RoutingError> {
        self.explain_with_cancel(request, &CancellationToken::new()).await
    }

    pub async fn explain_with_cancel(
        &self,
        request: &MatchRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<MatchOutcome, RoutingError> {
        let registry = self.live.snapshot();
        self.matcher
            .match_with_cancel(&registry, request, cancel)
            .await
            .map_err(|e| RoutingError::from_match(e, request))
    }

    /// Check `tools` against the definition's allowlist and the denylist.
    pub fn authorize(&self, definition: &AgentDefinition, tools: &ToolSet) -> std::result::Result<(), Forbidden> {
        self.guard.authorize(definition, tools)
    }

    /// Like [`Router::authorize`], looking the definition up by id.
    pub fn authorize_id(&self, id: &str, tools: &ToolSet) -> Result<Arc<AgentDefinition>> {
        let registry = self.live.snapshot();
        let definition = registry.get(id)?;
        self.guard.authorize(definition, tools)?;
        Ok(Arc::clone(definition))
    }

    pub fn live(&self) -> &Arc<LiveRegistry> {
        &self.live
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }
}

/// Registry load settings derived from the `[definitions]` section.
pub fn load_options(config: &SwitchboardConfig) -> LoadOptions {
    let defs = &config.definitions;
    LoadOptions {
        parse: ParseOptions {
            fallback_tier: ModelTier::new(defs.fallback_tier.as_str()).unwrap_or_default(),
            known_tiers: defs.model_tiers.clone(),
        },
        on_invalid: defs.on_invalid,
        concurrency: defs.concurrency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::{SwitchboardError, ToolCapability};
    use switchboard_definitions::{DefinitionSource, Registry};

    fn router_with(denied: ToolSet) -> Router {
        let sources = vec![
            DefinitionSource::new(
                "a.md",
                "---\nname: a\ndescription: summarize files\ntools: read-file\nmodel: capable\n---\nSummarize.",
            ),
            DefinitionSource::new(
                "b.md",
                "---\nname: b\ndescription: run build scripts\ntools: execute-shell\nmodel: fast\n---\nBuild.",
            ),
        ];
        let registry = Registry::load(sources, &LoadOptions::default()).unwrap();
        let live = Arc::new(LiveRegistry::new(registry, LoadOptions::default(), Vec::new()));
        Router::new(live, Matcher::default(), AccessGuard::new().with_denied(denied))
    }

    #[tokio::test]
    async fn resolve_then_authorize() {
        let router = router_with(ToolSet::new());
        let request = MatchRequest::new("run the build").with_required_tools([ToolCapability::ExecuteShell]);

        let winner = router.resolve(&request).await.unwrap();
        assert_eq!(winner.id().as_str(), "b");
        assert!(router.authorize(&winner, &ToolSet::from([ToolCapability::ExecuteShell])).is_ok());

        let a = router.live().snapshot().get("a").unwrap().clone();
        let err = router
            .authorize(&a, &ToolSet::from([ToolCapability::ExecuteShell]))
            .unwrap_err();
        assert_eq!(err.missing, ToolSet::from([ToolCapability::ExecuteShell]));
    }

    #[tokio::test]
    async fn no_candidates_carries_request() {
        let router = router_with(ToolSet::new());
        let request = MatchRequest::new("run the build").with_required_tools([ToolCapability::NetworkFetch]);
        let err = router.resolve(&request).await.unwrap_err();
        assert_eq!(err, RoutingError::NoCandidates { request });
    }

    #[tokio::test]
    async fn cancelled_resolve() {
        let router = router_with(ToolSet::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = router
            .resolve_with_cancel(&MatchRequest::new("anything"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, RoutingError::Cancelled);
    }

    #[tokio::test]
    async fn explain_ranks_every_candidate() {
        let router = router_with(ToolSet::new());
        let outcome = router.explain(&MatchRequest::new("summarize the files")).await.unwrap();
        let ids: Vec<&str> = outcome.ranked.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(outcome.ranked[0].text_score, 1.0);
    }

    #[test]
    fn authorize_id_reports_missing_and_denied() {
        let router = router_with(ToolSet::from([ToolCapability::ExecuteShell]));

        let err = router
            .authorize_id("nope", &ToolSet::from([ToolCapability::ReadFile]))
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::NotFound(_)));

        let err = router
            .authorize_id("b", &ToolSet::from([ToolCapability::ExecuteShell]))
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Forbidden(_)));

        assert!(router.authorize_id("a", &ToolSet::from([ToolCapability::ReadFile])).is_ok());
    }

    #[tokio::test]
    async fn from_config_uses_configured_dirs_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("deploy.md"),
            "---\nname: deploy\ndescription: deploy services\ntools: Bash\n---\nDeploy.",
        )
        .unwrap();

        let mut config = SwitchboardConfig::default();
        config.definitions.dirs = vec![dir.path().to_path_buf()];
        config.matching.min_score = 0.5;
        config.guard.denied_tools = vec!["execute-shell".into()];

        let router = Router::from_config(&config).await.unwrap();
        assert_eq!(router.matcher().policy().min_score, 0.5);

        let winner = router.resolve(&MatchRequest::new("deploy")).await.unwrap();
        assert_eq!(winner.model_tier().as_str(), "default");
        assert!(router.guard().authorize_invocation(&winner, ToolCapability::ExecuteShell).is_err());

        let err = router.resolve(&MatchRequest::new("cook dinner")).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoCandidates { .. }));
    }
}
