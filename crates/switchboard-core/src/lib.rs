//! # switchboard-core
//!
//! Core types and errors for Switchboard, the router that picks one
//! agent/command/skill definition for an incoming request.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod definition;
pub mod error;
pub mod tool;
pub mod types;

pub use definition::{AgentDefinition, DefinitionBody};
pub use error::{
    Forbidden, LoadError, MatchError, NotFound, ParseError, Result, RoutingError, ScoreError,
    SwitchboardError,
};
pub use tool::{ToolCapability, ToolSet, UnknownToolToken};
pub use types::*;
