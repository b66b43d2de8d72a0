#[cfg(test)]
mod tests {
    use switchboard_core::*;

    // ── Tool capability tests ──────────────────────────────────

    #[test]
    fn test_tool_capability_serde_uses_canonical_tokens() {
        let json = serde_json::to_string(&ToolCapability::ExecuteShell).unwrap();
        assert_eq!(json, "\"execute-shell\"");

        let restored: ToolCapability = serde_json::from_str("\"Bash\"").unwrap();
        assert_eq!(restored, ToolCapability::ExecuteShell);
    }

    #[test]
    fn test_tool_capability_rejects_wrong_case() {
        assert!("Execute-Shell".parse::<ToolCapability>().is_err());
        assert!("bash".parse::<ToolCapability>().is_err());
    }

    #[test]
    fn test_toolset_deserializes_mixed_tokens() {
        let set: ToolSet = serde_json::from_str(r#"["Read", "search-content", "read-file"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.tokens(), vec!["read-file", "search-content"]);
    }

    #[test]
    fn test_toolset_difference_keeps_order() {
        let requested = ToolSet::from([
            ToolCapability::SpawnAgent,
            ToolCapability::ReadFile,
            ToolCapability::WebSearch,
        ]);
        let allowed = ToolSet::from([ToolCapability::ReadFile]);
        assert_eq!(requested.difference(&allowed).to_string(), "web-search, spawn-agent");
    }

    // ── Request tests ──────────────────────────────────────────

    #[test]
    fn test_match_request_deserializes_with_defaults() {
        let request: MatchRequest = serde_json::from_str(r#"{"intent":"review my diff"}"#).unwrap();
        assert_eq!(request.intent, "review my diff");
        assert!(request.required_tools.is_empty());
        assert!(request.preferred_model_tier.is_none());
    }

    #[test]
    fn test_match_request_display() {
        let request = MatchRequest::new("run the build")
            .with_required_tools([ToolCapability::ExecuteShell])
            .with_preferred_tier(ModelTier::new("fast").unwrap());
        assert_eq!(
            request.to_string(),
            "intent 'run the build', requiring [execute-shell], preferring tier 'fast'"
        );
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_routing_error_keeps_request() {
        let request = MatchRequest::new("run").with_required_tools([ToolCapability::NetworkFetch]);
        let err = RoutingError::from_match(MatchError::NoCandidates, &request);
        assert!(err.to_string().contains("requiring [network-fetch]"));
        assert_eq!(err, RoutingError::NoCandidates { request });
    }

    #[test]
    fn test_unified_error_from_conversions() {
        let err: SwitchboardError = NotFound("ghost".into()).into();
        assert_eq!(err.to_string(), "definition not found: ghost");

        let err: SwitchboardError = LoadError::Worker("panicked".into()).into();
        assert!(err.to_string().starts_with("registry load failed"));

        let err: SwitchboardError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, SwitchboardError::Io(_)));
    }

    #[test]
    fn test_unknown_model_tier_lists_known() {
        let err = ParseError::UnknownModelTier {
            tier: "huge".into(),
            known: vec!["fast".into(), "capable".into()],
        };
        assert_eq!(err.to_string(), "unknown model tier 'huge' (known: fast, capable)");
    }
}
