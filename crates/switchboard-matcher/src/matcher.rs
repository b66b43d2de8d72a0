use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use switchboard_core::{AgentDefinition, DefinitionId, MatchError, MatchRequest};
use switchboard_definitions::Registry;

use crate::scorer::{Scorer, TokenOverlapScorer};

/// Bonus reported when a definition's tier equals the requested tier.
///
/// It only orders candidates whose text scores tie; a better text score
/// always wins regardless of tier.
pub const DEFAULT_TIER_BONUS: f64 = 0.01;
/// Scores closer than this are treated as equal and ordered by id.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// Numeric knobs of the ranking policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Candidates whose text score falls below this are dropped.
    pub min_score: f64,
    pub tie_epsilon: f64,
    pub tier_bonus: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            tier_bonus: DEFAULT_TIER_BONUS,
        }
    }
}

/// One scored definition.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub definition: Arc<AgentDefinition>,
    /// Scorer output, clamped to `[0, 1]`.
    pub text_score: f64,
    /// Tier bonus applied (0 when the tier did not match).
    pub tier_bonus: f64,
    /// `text_score + tier_bonus`, as reported to callers.
    pub score: f64,
}

impl RankedCandidate {
    pub fn id(&self) -> &DefinitionId {
        self.definition.id()
    }
}

/// A successful match: the winner plus every candidate that survived.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub winner: Arc<AgentDefinition>,
    pub score: f64,
    /// All surviving candidates, best first. `ranked[0]` is the winner.
    pub ranked: Vec<RankedCandidate>,
}

impl MatchOutcome {
    pub fn winner_id(&self) -> &DefinitionId {
        self.winner.id()
    }
}

/// Scores a registry snapshot against requests.
///
/// Holds no per-request state; clones share the scorer.
#[derive(Clone)]
pub struct Matcher {
    scorer: Arc<dyn Scorer>,
    policy: MatchPolicy,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Arc::new(TokenOverlapScorer), MatchPolicy::default())
    }
}

impl Matcher {
    pub fn new(scorer: Arc<dyn Scorer>, policy: MatchPolicy) -> Self {
        Self { scorer, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Match without a cancellation signal.
    pub async fn match_request(
        &self,
        registry: &Registry,
        request: &MatchRequest,
    ) -> Result<MatchOutcome, MatchError> {
        self.match_with_cancel(registry, request, &CancellationToken::new())
            .await
    }

    /// Rank every definition in `registry` against `request`.
    ///
    /// Definitions that lack any required tool are excluded before scoring.
    /// If `cancel` fires while the scorer runs, the in-flight scoring is
    /// dropped and [`MatchError::Cancelled`] is returned.
    pub async fn match_with_cancel(
        &self,
        registry: &Registry,
        request: &MatchRequest,
        cancel: &CancellationToken,
    ) -> Result<MatchOutcome, MatchError> {
        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled);
        }

        let eligible: Vec<&Arc<AgentDefinition>> = registry
            .all()
            .iter()
            .filter(|def| request.required_tools.is_subset(def.allowed_tools()))
            .collect();
        if eligible.is_empty() {
            debug!(%request, total = registry.len(), "no definition passes the tool filter");
            return Err(MatchError::NoCandidates);
        }

        let scoring = join_all(eligible.iter().map(|def| async move {
            self.scorer
                .score(&request.intent, def.trigger_description())
                .await
                .map(normalize)
                .map_err(|error| MatchError::Scorer {
                    id: def.id().clone(),
                    error,
                })
        }));

        let text_scores = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MatchError::Cancelled),
            scores = scoring => scores,
        };
        // First failure in registry order, not completion order.
        let text_scores = text_scores.into_iter().collect::<Result<Vec<f64>, MatchError>>()?;

        let candidates: Vec<RankedCandidate> = eligible
            .into_iter()
            .zip(text_scores)
            .filter(|(_, text_score)| *text_score >= self.policy.min_score)
            .map(|(def, text_score)| {
                let tier_bonus = match &request.preferred_model_tier {
                    Some(tier) if tier == def.model_tier() => self.policy.tier_bonus,
                    _ => 0.0,
                };
                RankedCandidate {
                    definition: Arc::clone(def),
                    text_score,
                    tier_bonus,
                    score: text_score + tier_bonus,
                }
            })
            .collect();

        let ranked = rank(candidates, self.policy.tie_epsilon);
        let Some(best) = ranked.first() else {
            debug!(%request, min_score = self.policy.min_score, "every candidate scored below the minimum");
            return Err(MatchError::NoCandidates);
        };

        debug!(
            winner = %best.id(),
            score = best.score,
            candidates = ranked.len(),
            scorer = self.scorer.name(),
            "matched request"
        );

        Ok(MatchOutcome {
            winner: Arc::clone(&best.definition),
            score: best.score,
            ranked,
        })
    }
}

fn normalize(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
}

/// Order candidates best first.
///
/// Candidates are sorted by text score, then grouped: each group starts at
/// the highest remaining text score and takes every candidate within
/// `epsilon` of it. A group is ordered by tier bonus (descending), then by
/// ascending id. The result depends only on the candidate set, never on
/// input order.
fn rank(mut candidates: Vec<RankedCandidate>, epsilon: f64) -> Vec<RankedCandidate> {
    candidates.sort_by(|a, b| b.text_score.total_cmp(&a.text_score).then_with(|| a.id().cmp(b.id())));

    let mut ranked = Vec::with_capacity(candidates.len());
    let mut rest = candidates.into_iter().peekable();
    while let Some(head) = rest.next() {
        let anchor = head.text_score;
        let mut group = vec![head];
        while let Some(next) = rest.next_if(|c| anchor - c.text_score <= epsilon) {
            group.push(next);
        }
        group.sort_by(|a, b| b.tier_bonus.total_cmp(&a.tier_bonus).then_with(|| a.id().cmp(b.id())));
        ranked.extend(group);
    }
    ranked
}
