use std::collections::{BTreeMap, HashSet};

use switchboard_core::{
    AgentDefinition, DefinitionBody, DefinitionId, DefinitionKind, ModelTier, ParseError,
    ToolCapability, ToolSet,
};
use tracing::debug;

/// One raw definition source, as read from disk or supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSource {
    /// Path or label used in error messages and kept on the definition.
    pub origin: String,
    pub kind: DefinitionKind,
    pub text: String,
}

impl DefinitionSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            kind: DefinitionKind::default(),
            text: text.into(),
        }
    }

    pub fn with_kind(mut self, kind: DefinitionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Tier handling applied while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Tier given to definitions that declare none.
    pub fallback_tier: ModelTier,
    /// Accepted tiers. Empty means any non-empty tier is accepted.
    pub known_tiers: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            fallback_tier: ModelTier::default(),
            known_tiers: Vec::new(),
        }
    }
}

/// Parse a definition with default options.
///
/// ```text
/// ---
/// name: build-runner
/// description: Run build scripts and report failures
/// tools: execute-shell, read-file
/// model: fast
/// ---
///
/// You are a build runner...
/// ```
pub fn parse(text: &str) -> Result<AgentDefinition, ParseError> {
    DefinitionParser::default().parse(text)
}

/// Turns definition text into validated [`AgentDefinition`]s.
///
/// Holds no mutable state, so one parser can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct DefinitionParser {
    options: ParseOptions,
}

impl DefinitionParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a source, carrying its origin and kind onto the definition.
    pub fn parse_source(&self, source: &DefinitionSource) -> Result<AgentDefinition, ParseError> {
        let def = self
            .parse(&source.text)?
            .with_kind(source.kind)
            .with_origin(source.origin.clone());
        debug!(id = %def.id(), origin = %source.origin, kind = %source.kind, "parsed definition");
        Ok(def)
    }

    pub fn parse(&self, text: &str) -> Result<AgentDefinition, ParseError> {
        let (header, body) = split_header(text)?;
        let header = parse_header(header)?;

        let id = DefinitionId::new(header.id.unwrap_or_default())?;

        let description = header.description.unwrap_or_default();
        if description.is_empty() {
            return Err(ParseError::MissingDescription);
        }

        let tools = parse_tools(header.tools.as_deref().unwrap_or(&[]))?;
        let tier = self.resolve_tier(header.tier)?;

        let body = body.trim();
        if body.is_empty() {
            return Err(ParseError::EmptyBody);
        }

        Ok(
            AgentDefinition::new(id, description, tools, tier, DefinitionBody::new(body))
                .with_metadata(header.metadata),
        )
    }

    fn resolve_tier(&self, declared: Option<String>) -> Result<ModelTier, ParseError> {
        let Some(tier) = declared.and_then(ModelTier::new) else {
            return Ok(self.options.fallback_tier.clone());
        };
        let known = &self.options.known_tiers;
        if !known.is_empty() && !known.iter().any(|k| k == tier.as_str()) {
            return Err(ParseError::UnknownModelTier {
                tier: tier.to_string(),
                known: known.clone(),
            });
        }
        Ok(tier)
    }
}

/// Split the text into the header block and the body that follows it.
fn split_header(content: &str) -> Result<(&str, &str), ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();

    let rest = trimmed.strip_prefix("---").ok_or(ParseError::MissingHeader)?;
    let (opening_tail, after_opening) = rest
        .split_once('\n')
        .ok_or(ParseError::UnterminatedHeader)?;
    if !opening_tail.trim().is_empty() {
        return Err(ParseError::MissingHeader);
    }

    let mut offset = 0;
    for line in after_opening.split_inclusive('\n') {
        if line.trim() == "---" {
            let header = &after_opening[..offset];
            let body = &after_opening[offset + line.len()..];
            return Ok((header, body));
        }
        offset += line.len();
    }

    Err(ParseError::UnterminatedHeader)
}

#[derive(Debug, Default)]
struct RawHeader {
    id: Option<String>,
    description: Option<String>,
    tools: Option<Vec<String>>,
    tier: Option<String>,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Id,
    Description,
    Tools,
    Tier,
    Other(String),
}

impl Field {
    fn from_key(key: &str) -> Self {
        match key {
            "name" | "id" => Self::Id,
            "description" => Self::Description,
            "tools" | "allowed-tools" | "allowed_tools" | "allowedTools" => Self::Tools,
            "model" | "model-tier" | "model_tier" | "modelTier" => Self::Tier,
            other => Self::Other(other.to_string()),
        }
    }

    /// Name used for duplicate detection, with aliases folded together.
    fn canonical(&self) -> &str {
        match self {
            Self::Id => "name",
            Self::Description => "description",
            Self::Tools => "tools",
            Self::Tier => "model",
            Self::Other(key) => key,
        }
    }
}

fn parse_header(header: &str) -> Result<RawHeader, ParseError> {
    let mut raw = RawHeader::default();
    let mut seen: HashSet<String> = HashSet::new();
    // Field whose value is being continued by `- item` lines.
    let mut open_list: Option<Field> = None;

    for (idx, line) in header.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix("- ").or_else(|| (line == "-").then_some("")) {
            match &open_list {
                Some(Field::Tools) => {
                    raw.tools.get_or_insert_with(Vec::new).push(unquote(item));
                    continue;
                }
                Some(Field::Other(key)) => {
                    let entry = raw.metadata.entry(key.clone()).or_default();
                    if !entry.is_empty() {
                        entry.push_str(", ");
                    }
                    entry.push_str(&unquote(item));
                    continue;
                }
                _ => {
                    return Err(ParseError::MalformedHeaderLine {
                        line: line_no,
                        content: line.to_string(),
                    });
                }
            }
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(ParseError::MalformedHeaderLine {
                line: line_no,
                content: line.to_string(),
            });
        };
        let field = Field::from_key(key.trim());
        if !seen.insert(field.canonical().to_string()) {
            return Err(ParseError::DuplicateHeaderField(field.canonical().to_string()));
        }

        let value = value.trim();
        open_list = value.is_empty().then(|| field.clone());

        match field {
            Field::Id => raw.id = Some(unquote(value)),
            Field::Description => raw.description = Some(unquote(value)),
            Field::Tools => raw.tools = Some(split_list(value)),
            Field::Tier => raw.tier = Some(unquote(value)),
            Field::Other(key) => {
                raw.metadata.insert(key, unquote(value));
            }
        }
    }

    Ok(raw)
}

/// Parse `a, b`, `[a, b]` or an empty value into list entries.
fn split_list(value: &str) -> Vec<String> {
    let inner = value.trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|t| unquote(t.trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_tools(entries: &[String]) -> Result<ToolSet, ParseError> {
    let mut tools = ToolSet::new();
    for entry in entries.iter().filter(|e| !e.is_empty()) {
        let cap: ToolCapability = entry
            .parse()
            .map_err(|_| ParseError::UnknownToolToken(entry.clone()))?;
        if !tools.insert(cap) {
            return Err(ParseError::DuplicateToolDeclaration(cap));
        }
    }
    Ok(tools)
}

/// Remove surrounding quotes from a header value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
