//! Access guard.
//!
//! Checked before every tool invocation: a definition may only use the
//! tools it declared, minus anything the host has denied outright.

pub mod guard;

pub use guard::AccessGuard;
