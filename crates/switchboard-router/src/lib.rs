//! # switchboard-router
//!
//! The single entry point a host talks to. A [`Router`] combines the
//! current registry snapshot, the matcher and the access guard:
//!
//! 1. `resolve` picks the best definition for a request
//! 2. the host runs it, calling `authorize` before every tool invocation
//!
//! [`LiveRegistry`] lets the registry be rebuilt from disk while requests
//! are in flight; [`Host`] exposes the router over a JSON-lines stream.

pub mod host;
pub mod live;
pub mod router;
pub mod watch;

pub use host::{ErrorCode, Host, HostError, HostReply, HostRequest};
pub use live::LiveRegistry;
pub use router::{Router, load_options};
pub use watch::{DefinitionWatcher, watch};
