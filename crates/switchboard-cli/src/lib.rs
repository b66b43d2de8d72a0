//! # switchboard-cli
//!
//! Command-line interface for the Switchboard definition router.
//!
//! ## Commands
//!
//! - `switchboard list`: List loaded definitions
//! - `switchboard show <id>`: Show one definition, body included
//! - `switchboard validate`: Check every definition file and report problems
//! - `switchboard resolve <intent>`: Pick the definition for a request
//! - `switchboard authorize <id> --tool <tool>`: Check a tool invocation
//! - `switchboard serve`: Answer JSON-lines requests on stdin/stdout
//! - `switchboard config`: Show the effective configuration

pub mod commands;

pub use commands::Cli;
