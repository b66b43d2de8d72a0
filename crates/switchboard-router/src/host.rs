use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_core::{MatchRequest, ModelTier, RoutingError, SwitchboardError, ToolSet};

use crate::router::Router;

/// One request line from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostRequest {
    Resolve {
        intent: String,
        #[serde(default)]
        required_tools: Vec<String>,
        #[serde(default)]
        preferred_model_tier: Option<String>,
    },
    Authorize {
        id: String,
        #[serde(default)]
        tools: Vec<String>,
    },
    Reload,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoMatch,
    LoadFailed,
    ForbiddenTool,
    InvalidRequest,
    NotFound,
    Cancelled,
    ScorerFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostError {
    pub code: ErrorCode,
    pub message: String,
}

/// One reply line: `{"ok":true,"result":..}` or `{"ok":false,"error":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HostError>,
}

impl HostReply {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(HostError {
                code,
                message: message.into(),
            }),
        }
    }
}

impl From<RoutingError> for HostReply {
    fn from(e: RoutingError) -> Self {
        let code = match e {
            RoutingError::NoCandidates { .. } => ErrorCode::NoMatch,
            RoutingError::Cancelled => ErrorCode::Cancelled,
            RoutingError::Scorer { .. } => ErrorCode::ScorerFailed,
        };
        Self::failure(code, e.to_string())
    }
}

impl From<SwitchboardError> for HostReply {
    fn from(e: SwitchboardError) -> Self {
        let code = match &e {
            SwitchboardError::NotFound(_) => ErrorCode::NotFound,
            SwitchboardError::Forbidden(_) => ErrorCode::ForbiddenTool,
            SwitchboardError::Load(_) => ErrorCode::LoadFailed,
            SwitchboardError::Routing(RoutingError::NoCandidates { .. }) => ErrorCode::NoMatch,
            SwitchboardError::Routing(RoutingError::Cancelled) => ErrorCode::Cancelled,
            SwitchboardError::Routing(RoutingError::Scorer { .. }) => ErrorCode::ScorerFailed,
            _ => ErrorCode::InvalidRequest,
        };
        Self::failure(code, e.to_string())
    }
}

/// Serves a [`Router`] to a host process over newline-delimited JSON.
pub struct Host {
    router: Arc<Router>,
}

impl Host {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// Parse and answer a single line. Never fails: problems become
    /// error replies.
    pub async fn handle_line(&self, line: &str, cancel: &CancellationToken) -> HostReply {
        match serde_json::from_str::<HostRequest>(line) {
            Ok(request) => self.handle(request, cancel).await,
            Err(e) => {
                debug!(error = %e, "rejecting malformed request");
                HostReply::failure(ErrorCode::InvalidRequest, format!("malformed request: {}", e))
            }
        }
    }

    pub async fn handle(&self, request: HostRequest, cancel: &CancellationToken) -> HostReply {
        match request {
            HostRequest::Resolve {
                intent,
                required_tools,
                preferred_model_tier,
            } => {
                let tools = match ToolSet::parse_tokens(&required_tools) {
                    Ok(tools) => tools,
                    Err(e) => return HostReply::failure(ErrorCode::InvalidRequest, e.to_string()),
                };
                let mut request = MatchRequest::new(intent).with_required_tools(tools);
                if let Some(tier) = preferred_model_tier.and_then(ModelTier::new) {
                    request = request.with_preferred_tier(tier);
                }
                match self.router.explain_with_cancel(&request, cancel).await {
                    Ok(outcome) => {
                        let def = &outcome.winner;
                        HostReply::success(json!({
                            "id": def.id(),
                            "body": def.body().as_str(),
                            "allowedTools": def.allowed_tools(),
                            "modelTier": def.model_tier(),
                            "score": outcome.score,
                        }))
                    }
                    Err(e) => e.into(),
                }
            }
            HostRequest::Authorize { id, tools } => {
                let tools = match ToolSet::parse_tokens(&tools) {
                    Ok(tools) => tools,
                    Err(e) => return HostReply::failure(ErrorCode::InvalidRequest, e.to_string()),
                };
                match self.router.authorize_id(&id, &tools) {
                    Ok(_) => HostReply::success(json!({ "id": id, "tools": tools })),
                    Err(e) => e.into(),
                }
            }
            HostRequest::Reload => match self.router.live().reload_from_disk().await {
                Ok(registry) => HostReply::success(json!({
                    "count": registry.len(),
                    "skipped": registry.skipped().len(),
                })),
                Err(e) => SwitchboardError::from(e).into(),
            },
            HostRequest::List => {
                let registry = self.router.live().snapshot();
                let items: Vec<Value> = registry
                    .all()
                    .iter()
                    .map(|def| {
                        json!({
                            "id": def.id(),
                            "kind": def.kind(),
                            "description": def.trigger_description(),
                            "tools": def.allowed_tools(),
                            "model_tier": def.model_tier(),
                        })
                    })
                    .collect();
                HostReply::success(Value::Array(items))
            }
        }
    }

    /// Answer requests from `reader` until EOF or `shutdown` fires.
    ///
    /// Blank lines are ignored. A request in flight when `shutdown` fires is
    /// answered with `CANCELLED`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W, shutdown: CancellationToken) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0usize;
        info!("host session started");

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }

            let reply = self.handle_line(&line, &shutdown.child_token()).await;
            if let Some(error) = &reply.error {
                warn!(code = ?error.code, message = %error.message, "request failed");
            }

            let mut out = serde_json::to_vec(&reply).map_err(std::io::Error::other)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
            handled += 1;
        }

        info!(requests = handled, "host session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::LiveRegistry;
    use switchboard_definitions::{DefinitionSource, LoadOptions, Registry};
    use switchboard_guard::AccessGuard;
    use switchboard_matcher::Matcher;

    fn host() -> Host {
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
        Host::new(Arc::new(Router::new(live, Matcher::default(), AccessGuard::new())))
    }

    async fn ask(host: &Host, line: &str) -> HostReply {
        host.handle_line(line, &CancellationToken::new()).await
    }

    fn code(reply: &HostReply) -> ErrorCode {
        reply.error.as_ref().map(|e| e.code).unwrap()
    }

    #[tokio::test]
    async fn resolve_returns_definition() {
        let reply = ask(
            &host(),
            r#"{"op":"resolve","intent":"run the build","required_tools":["execute-shell"]}"#,
        )
        .await;
        assert!(reply.ok);
        let result = reply.result.unwrap();
        assert_eq!(result["id"], "b");
        assert_eq!(result["body"], "Build.");
        assert_eq!(result["allowedTools"], json!(["execute-shell"]));
        assert_eq!(result["modelTier"], "fast");
        assert!(result.get("definition").is_none());
    }

    #[tokio::test]
    async fn resolve_failures_map_to_codes() {
        let host = host();
        let reply = ask(&host, r#"{"op":"resolve","intent":"x","required_tools":["network-fetch"]}"#).await;
        assert_eq!(code(&reply), ErrorCode::NoMatch);

        let reply = ask(&host, r#"{"op":"resolve","intent":"x","required_tools":["teleport"]}"#).await;
        assert_eq!(code(&reply), ErrorCode::InvalidRequest);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let reply = host.handle_line(r#"{"op":"resolve","intent":"x"}"#, &cancel).await;
        assert_eq!(code(&reply), ErrorCode::Cancelled);
    }

    #[tokio::test]
    async fn authorize_codes() {
        let host = host();
        let reply = ask(&host, r#"{"op":"authorize","id":"a","tools":["Read"]}"#).await;
        assert!(reply.ok);
        assert_eq!(reply.result.unwrap()["tools"], json!(["read-file"]));

        let reply = ask(&host, r#"{"op":"authorize","id":"a","tools":["execute-shell"]}"#).await;
        assert_eq!(code(&reply), ErrorCode::ForbiddenTool);

        let reply = ask(&host, r#"{"op":"authorize","id":"zzz","tools":[]}"#).await;
        assert_eq!(code(&reply), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_and_reload() {
        let host = host();
        let reply = ask(&host, r#"{"op":"list"}"#).await;
        let items = reply.result.unwrap();
        assert_eq!(items.as_array().unwrap().len(), 2);
        assert_eq!(items[1]["tools"], json!(["execute-shell"]));

        // No directories configured: the reload yields an empty registry.
        let reply = ask(&host, r#"{"op":"reload"}"#).await;
        assert_eq!(reply.result.unwrap()["count"], 0);
    }

    #[test]
    fn replies_serialize_compactly() {
        let ok = serde_json::to_string(&HostReply::success(json!(1))).unwrap();
        assert_eq!(ok, r#"{"ok":true,"result":1}"#);
        let err = serde_json::to_string(&HostReply::failure(ErrorCode::NoMatch, "none")).unwrap();
        assert_eq!(err, r#"{"ok":false,"error":{"code":"NO_MATCH","message":"none"}}"#);
    }

    #[tokio::test]
    async fn serve_answers_each_line() {
        let input = concat!(
            r#"{"op":"list"}"#,
            "\n\nnot json\n",
            r#"{"op":"resolve","intent":"summarize files"}"#,
            "\n"
        );
        let mut output = Vec::new();
        host()
            .serve(input.as_bytes(), &mut output, CancellationToken::new())
            .await
            .unwrap();

        let replies: Vec<HostReply> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert!(replies[0].ok);
        assert_eq!(code(&replies[1]), ErrorCode::InvalidRequest);
        assert_eq!(replies[2].result.as_ref().unwrap()["id"], "a");
    }
}
