//! # switchboard-definitions
//!
//! Loading agent, command and skill definitions. Each definition is a
//! Markdown file with a front-matter header:
//!
//! ```markdown
//! ---
//! name: code-reviewer
//! description: Review a diff for bugs and style problems
//! tools: read-file, search-content
//! model: capable
//! ---
//!
//! You are a meticulous reviewer...
//! ```
//!
//! The header drives routing; the body is handed to the host untouched.
//!
//! ## Loading
//!
//! 1. [`discover`] collects sources from the configured directories
//! 2. [`DefinitionParser`] validates each source into an `AgentDefinition`
//! 3. [`Registry`] accumulates them, rejecting duplicate ids, and is then
//!    frozen: reloading builds a new registry instead of editing this one

pub mod discovery;
pub mod parser;
pub mod registry;

pub use discovery::discover;
pub use parser::{DefinitionParser, DefinitionSource, ParseOptions, parse};
pub use registry::{LoadOptions, Registry, SkippedSource};
