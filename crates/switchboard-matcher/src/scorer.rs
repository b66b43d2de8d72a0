use async_trait::async_trait;
use std::collections::BTreeSet;
use switchboard_core::ScoreError;

/// Scores how well a definition's description fits a request intent.
///
/// Implementations return a value in `[0, 1]`; the matcher clamps anything
/// outside that range and treats NaN as 0. Scorers that call out to a model
/// or the network are fine: the matcher runs them concurrently and drops
/// them if the caller cancels.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Scorer name, used in logs.
    fn name(&self) -> &str;

    async fn score(&self, intent: &str, description: &str) -> Result<f64, ScoreError>;
}

/// Fraction of the intent's tokens that also appear in the description.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapScorer;

impl TokenOverlapScorer {
    pub fn overlap(intent: &str, description: &str) -> f64 {
        let wanted = tokenize(intent);
        if wanted.is_empty() {
            return 0.0;
        }
        let offered = tokenize(description);
        let shared = wanted.intersection(&offered).count();
        shared as f64 / wanted.len() as f64
    }
}

#[async_trait]
impl Scorer for TokenOverlapScorer {
    fn name(&self) -> &str {
        "token_overlap"
    }

    async fn score(&self, intent: &str, description: &str) -> Result<f64, ScoreError> {
        Ok(Self::overlap(intent, description))
    }
}

/// Adapts a plain function into a [`Scorer`].
pub struct FnScorer<F> {
    name: String,
    f: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Scorer for FnScorer<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, intent: &str, description: &str) -> Result<f64, ScoreError> {
        Ok((self.f)(intent, description))
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "me", "my", "of", "on", "or", "please", "that", "the", "this", "to", "use", "when", "with",
    "you", "your",
];

/// Lowercased, de-duplicated content tokens of `text`.
///
/// Splits on anything that is not alphanumeric, drops one-character tokens
/// and common stop words, and folds a trailing plural `s`
/// (`scripts` → `script`, but not `class`).
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .map(fold_plural)
        .collect()
}

fn fold_plural(token: String) -> String {
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token
    }
}
