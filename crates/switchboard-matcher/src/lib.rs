//! # switchboard-matcher
//!
//! Ranks registered definitions against a routing request. Matching is
//! policy, not language understanding: a hard tool filter, a pluggable
//! text scorer, a small model-tier bonus, and an id tie-break that makes
//! the winner a pure function of the inputs.

pub mod matcher;
pub mod scorer;

pub use matcher::{MatchOutcome, MatchPolicy, Matcher, RankedCandidate};
pub use scorer::{FnScorer, Scorer, TokenOverlapScorer, tokenize};
