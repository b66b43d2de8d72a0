use std::path::PathBuf;
use thiserror::Error;

use crate::tool::{ToolCapability, ToolSet};
use crate::types::{DefinitionId, MatchRequest};

// ── Parse errors ───────────────────────────────────────────────

/// Why a single definition source was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("definition must start with a '---' header block")]
    MissingHeader,

    #[error("header block is missing its closing '---'")]
    UnterminatedHeader,

    #[error("header line {line} is not a 'key: value' pair: {content}")]
    MalformedHeaderLine { line: usize, content: String },

    #[error("header field '{0}' is declared more than once")]
    DuplicateHeaderField(String),

    #[error("definition has no name")]
    MissingId,

    #[error("definition has no description")]
    MissingDescription,

    #[error("unknown tool token '{0}'")]
    UnknownToolToken(String),

    #[error("tool '{0}' is declared more than once")]
    DuplicateToolDeclaration(ToolCapability),

    #[error("unknown model tier '{tier}' (known: {})", .known.join(", "))]
    UnknownModelTier { tier: String, known: Vec<String> },

    #[error("definition body is empty")]
    EmptyBody,
}

// ── Load errors ────────────────────────────────────────────────

/// Why a registry could not be built. Any of these aborts the whole load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("invalid definition in {origin}: {error}")]
    Parse {
        origin: String,
        #[source]
        error: ParseError,
    },

    #[error("duplicate definition id '{id}': declared in {first} and {second}")]
    DuplicateId {
        id: DefinitionId,
        first: String,
        second: String,
    },

    #[error("failed to read definitions at {}: {reason}", .path.display())]
    Discovery { path: PathBuf, reason: String },

    #[error("definition loader worker failed: {0}")]
    Worker(String),
}

/// A lookup by id found nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("definition not found: {0}")]
pub struct NotFound(pub String);

// ── Match / routing errors ─────────────────────────────────────

/// A scoring function failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ScoreError(pub String);

/// Why the matcher produced no winner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("no definition satisfies the request")]
    NoCandidates,

    #[error("matching was cancelled")]
    Cancelled,

    #[error("scorer failed on '{id}': {error}")]
    Scorer {
        id: DefinitionId,
        #[source]
        error: ScoreError,
    },
}

/// Failure returned by the invoker facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("no definition matches {request}")]
    NoCandidates { request: MatchRequest },

    #[error("routing was cancelled")]
    Cancelled,

    #[error("scorer failed on '{id}': {error}")]
    Scorer {
        id: DefinitionId,
        #[source]
        error: ScoreError,
    },
}

impl RoutingError {
    /// Attach the originating request to a matcher failure.
    pub fn from_match(err: MatchError, request: &MatchRequest) -> Self {
        match err {
            MatchError::NoCandidates => Self::NoCandidates {
                request: request.clone(),
            },
            MatchError::Cancelled => Self::Cancelled,
            MatchError::Scorer { id, error } => Self::Scorer { id, error },
        }
    }
}

// ── Authorization errors ───────────────────────────────────────

/// A definition asked for tools outside its declared allowlist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("definition '{definition}' is not permitted to use: {missing}")]
pub struct Forbidden {
    pub definition: DefinitionId,
    /// Exactly the requested tools that were refused.
    pub missing: ToolSet,
}

// ── Unified error ──────────────────────────────────────────────

/// Unified error type used at process boundaries (CLI, host loop).
#[derive(Error, Debug)]
pub enum SwitchboardError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("registry load failed: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;
