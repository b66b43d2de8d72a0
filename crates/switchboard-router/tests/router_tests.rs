#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    use switchboard_config::SwitchboardConfig;
    use switchboard_core::*;
    use switchboard_definitions::{LoadOptions, Registry};
    use switchboard_guard::AccessGuard;
    use switchboard_matcher::{MatchPolicy, Matcher, Scorer};
    use switchboard_router::{ErrorCode, Host, LiveRegistry, Router};

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// agents/, commands/ and skills/ trees with one definition each.
    fn plugin_tree(root: &Path) -> SwitchboardConfig {
        write(
            root,
            "agents/reviewer.md",
            "---\nname: reviewer\ndescription: Review code changes for bugs\ntools: Read, Grep\nmodel: capable\n---\nReview carefully.",
        );
        write(
            root,
            "commands/build.md",
            "---\nname: build\ndescription: Run the build scripts\nallowed-tools: [execute-shell, read-file]\nmodel: fast\n---\nRun `make`.",
        );
        write(
            root,
            "skills/release-notes/SKILL.md",
            "---\nname: release-notes\ndescription: Draft release notes from commits\ntools:\n  - execute-shell\n  - write-file\n---\nSummarize the log.",
        );
        write(root, "agents/README.md", "Not a definition.");

        let mut config = SwitchboardConfig::default();
        config.definitions.dirs = vec![root.join("agents"), root.join("commands"), root.join("skills")];
        config.definitions.model_tiers = vec!["fast".into(), "capable".into(), "default".into()];
        config
    }

    // ── Loading ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_discovery_infers_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::from_config(&plugin_tree(dir.path())).await.unwrap();
        let registry = router.live().snapshot();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("reviewer").unwrap().kind(), DefinitionKind::Agent);
        assert_eq!(registry.get("build").unwrap().kind(), DefinitionKind::Command);
        let notes = registry.get("release-notes").unwrap();
        assert_eq!(notes.kind(), DefinitionKind::Skill);
        assert_eq!(notes.model_tier().as_str(), "default");
        assert_eq!(
            notes.allowed_tools(),
            &ToolSet::from([ToolCapability::WriteFile, ToolCapability::ExecuteShell])
        );
    }

    #[tokio::test]
    async fn test_unknown_tier_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = plugin_tree(dir.path());
        config.definitions.model_tiers = vec!["fast".into(), "default".into()];

        let err = Router::from_config(&config).await.err().unwrap();
        match err {
            LoadError::Parse { origin, error } => {
                assert!(origin.ends_with("reviewer.md"));
                assert!(matches!(error, ParseError::UnknownModelTier { .. }));
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_skip_policy_loads_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = plugin_tree(dir.path());
        write(dir.path(), "agents/broken.md", "---\nname: broken\ntools: teleport\n---\nx");
        config.definitions.on_invalid = InvalidPolicy::Skip;

        let router = Router::from_config(&config).await.unwrap();
        let registry = router.live().snapshot();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.skipped().len(), 1);
        assert!(registry.skipped()[0].origin.ends_with("broken.md"));
    }

    #[tokio::test]
    async fn test_duplicate_across_directories_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = plugin_tree(dir.path());
        write(dir.path(), "skills/build.md", "---\nname: build\ndescription: Another build\n---\nx");
        config.definitions.on_invalid = InvalidPolicy::Skip;

        let err = Router::from_config(&config).await.err().unwrap();
        assert!(matches!(err, LoadError::DuplicateId { ref id, .. } if id.as_str() == "build"));
    }

    // ── Routing ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_resolve_and_guard_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::from_config(&plugin_tree(dir.path())).await.unwrap();

        let request = MatchRequest::new("please review these code changes");
        let winner = router.resolve(&request).await.unwrap();
        assert_eq!(winner.id().as_str(), "reviewer");

        assert!(router
            .authorize(&winner, &ToolSet::from([ToolCapability::ReadFile]))
            .is_ok());
        let denied = router
            .authorize(&winner, &ToolSet::from([ToolCapability::ExecuteShell, ToolCapability::SearchContent]))
            .unwrap_err();
        assert_eq!(denied.missing, ToolSet::from([ToolCapability::ExecuteShell]));

        let request = MatchRequest::new("review code").with_required_tools([ToolCapability::ExecuteShell]);
        let winner = router.resolve(&request).await.unwrap();
        assert_ne!(winner.id().as_str(), "reviewer");
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic_across_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let router = Router::from_config(&plugin_tree(dir.path())).await.unwrap();
        let request = MatchRequest::new("unrelated words entirely");

        let first = router.resolve(&request).await.unwrap();
        router.live().reload_from_disk().await.unwrap();
        let second = router.resolve(&request).await.unwrap();

        // Every candidate scores zero, so the smallest id wins.
        assert_eq!(first.id().as_str(), "build");
        assert_eq!(first.id(), second.id());
    }

    struct StalledScorer;

    #[async_trait]
    impl Scorer for StalledScorer {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn score(&self, _: &str, _: &str) -> std::result::Result<f64, ScoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancellation_leaves_registry_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = plugin_tree(dir.path());
        let live = Arc::new(LiveRegistry::load(LoadOptions::default(), config.definitions.dirs.clone()).await.unwrap());
        let router = Router::new(
            Arc::clone(&live),
            Matcher::new(Arc::new(StalledScorer), MatchPolicy::default()),
            AccessGuard::new(),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = router
            .resolve_with_cancel(&MatchRequest::new("build"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, RoutingError::Cancelled);
        assert_eq!(live.snapshot().len(), 3);
    }

    // ── Host protocol ──────────────────────────────────────────

    #[tokio::test]
    async fn test_host_session() {
        let dir = tempfile::tempdir().unwrap();
        let router = Arc::new(Router::from_config(&plugin_tree(dir.path())).await.unwrap());
        let host = Host::new(router);

        let input = [
            r#"{"op":"resolve","intent":"draft release notes","required_tools":["Bash"]}"#,
            r#"{"op":"authorize","id":"release-notes","tools":["network-fetch"]}"#,
            r#"{"op":"resolve","intent":"x","required_tools":["spawn-agent"]}"#,
            r#"{"op":"frobnicate"}"#,
            r#"{"op":"list"}"#,
        ]
        .join("\n");
        let mut output = Vec::new();
        host.serve(input.as_bytes(), &mut output, CancellationToken::new())
            .await
            .unwrap();

        let replies: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 5);
        assert_eq!(replies[0]["result"]["id"], "release-notes");
        assert_eq!(replies[1]["error"]["code"], "FORBIDDEN_TOOL");
        assert_eq!(replies[2]["error"]["code"], "NO_MATCH");
        assert_eq!(replies[3]["error"]["code"], "INVALID_REQUEST");
        assert_eq!(replies[4]["result"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_host_reload_failure_keeps_registry() {
        let dir = tempfile::tempdir().unwrap();
        let router = Arc::new(Router::from_config(&plugin_tree(dir.path())).await.unwrap());
        let host = Host::new(Arc::clone(&router));

        write(dir.path(), "commands/clash.md", "---\nname: reviewer\ndescription: clash\n---\nx");
        let reply = host
            .handle_line(r#"{"op":"reload"}"#, &CancellationToken::new())
            .await;
        assert_eq!(reply.error.unwrap().code, ErrorCode::LoadFailed);
        assert_eq!(router.live().snapshot().len(), 3);
    }

    #[test]
    fn test_registry_catalog_lists_every_definition() {
        let registry = Registry::load(
            vec![switchboard_definitions::DefinitionSource::new(
                "a.md",
                "---\nname: a\ndescription: first\n---\nbody",
            )],
            &LoadOptions::default(),
        )
        .unwrap();
        let catalog = registry.catalog().unwrap();
        assert!(catalog.contains("<id>a</id>"));
        assert!(!catalog.contains("body"));
    }
}
