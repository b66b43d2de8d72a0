//! # switchboard-config
//!
//! Configuration for the router. Reads `switchboard.toml`, then applies
//! environment variable overrides; CLI flags are layered on by the caller.

pub mod loader;
pub mod schema;

pub use loader::{ConfigLoader, expand_home};
pub use schema::{
    ConfigWarning, DefinitionsConfig, GuardConfig, LoggingConfig, MatchingConfig, SwitchboardConfig,
    WarningSeverity, WatchConfig,
};
