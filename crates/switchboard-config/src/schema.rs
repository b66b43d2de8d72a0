use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use switchboard_core::{InvalidPolicy, ModelTier, ToolCapability, ToolSet};

/// Root configuration: maps to `switchboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    pub definitions: DefinitionsConfig,
    pub matching: MatchingConfig,
    pub guard: GuardConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

// ── Definitions ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    /// Directories scanned for definition files. `~/` expands to home.
    pub dirs: Vec<PathBuf>,
    /// What to do with a source that fails to parse: "abort" or "skip".
    pub on_invalid: InvalidPolicy,
    /// Tier given to definitions that declare none.
    pub fallback_tier: String,
    /// Accepted tiers. Empty accepts any non-empty tier.
    pub model_tiers: Vec<String>,
    /// Parallel file reads and parse workers.
    pub concurrency: usize,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        let base = PathBuf::from("~/.switchboard");
        Self {
            dirs: vec![base.join("agents"), base.join("commands"), base.join("skills")],
            on_invalid: InvalidPolicy::Abort,
            fallback_tier: ModelTier::DEFAULT_FALLBACK.into(),
            model_tiers: Vec::new(),
            concurrency: 8,
        }
    }
}

// ── Matching ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Candidates scoring below this (before the tier bonus) are dropped.
    pub min_score: f64,
    /// Scores within this distance rank as ties, broken by id.
    pub tie_epsilon: f64,
    /// Orders tied candidates whose tier equals the preferred tier.
    pub tier_bonus: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            tie_epsilon: 1e-9,
            tier_bonus: 0.01,
        }
    }
}

// ── Guard ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Tools refused to every definition, as canonical tokens or host aliases.
    pub denied_tools: Vec<String>,
}

impl GuardConfig {
    /// The denylist as a tool set. Unknown tokens are dropped here;
    /// [`SwitchboardConfig::validate`] reports them.
    pub fn denied_tool_set(&self) -> ToolSet {
        self.denied_tools
            .iter()
            .filter_map(|t| t.parse::<ToolCapability>().ok())
            .collect()
    }
}

// ── Watch ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Reload definitions when files in the definition directories change.
    pub enabled: bool,
    /// Quiet period after the last change before reloading.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: 250,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A problem found by [`SwitchboardConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl SwitchboardConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Definition directories ───
        if self.definitions.dirs.is_empty() {
            warnings.push(ConfigWarning {
                field: "definitions.dirs".into(),
                message: "no definition directories configured".into(),
                severity: WarningSeverity::Warning,
                hint: Some("The registry will be empty. Add e.g. '~/.switchboard/agents'".into()),
            });
        }

        if self.definitions.concurrency == 0 {
            warnings.push(ConfigWarning {
                field: "definitions.concurrency".into(),
                message: "concurrency is 0, nothing would be loaded".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 8".into()),
            });
        }

        // ── Model tiers ───
        let fallback = self.definitions.fallback_tier.trim();
        if fallback.is_empty() {
            warnings.push(ConfigWarning {
                field: "definitions.fallback_tier".into(),
                message: "fallback tier is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some(format!("Set to e.g. '{}'", ModelTier::DEFAULT_FALLBACK)),
            });
        } else if !self.definitions.model_tiers.is_empty()
            && !self.definitions.model_tiers.iter().any(|t| t == fallback)
        {
            warnings.push(ConfigWarning {
                field: "definitions.fallback_tier".into(),
                message: format!("fallback tier '{}' is not one of model_tiers", fallback),
                severity: WarningSeverity::Error,
                hint: Some(format!("Known tiers: {}", self.definitions.model_tiers.join(", "))),
            });
        }

        // ── Matching ───
        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.min_score) {
            warnings.push(ConfigWarning {
                field: "matching.min_score".into(),
                message: format!("min_score {} is out of range", m.min_score),
                severity: WarningSeverity::Error,
                hint: Some("Scores are normalized; use a value between 0.0 and 1.0".into()),
            });
        }
        if !(m.tie_epsilon >= 0.0) {
            warnings.push(ConfigWarning {
                field: "matching.tie_epsilon".into(),
                message: format!("tie_epsilon {} must not be negative", m.tie_epsilon),
                severity: WarningSeverity::Error,
                hint: Some("The default is 1e-9".into()),
            });
        }
        if !(m.tier_bonus.is_finite() && m.tier_bonus >= 0.0) {
            warnings.push(ConfigWarning {
                field: "matching.tier_bonus".into(),
                message: format!("tier_bonus {} must be a non-negative number", m.tier_bonus),
                severity: WarningSeverity::Error,
                hint: Some("The bonus only orders tied candidates; the default is 0.01".into()),
            });
        }

        // ── Guard ───
        for token in &self.guard.denied_tools {
            if token.parse::<ToolCapability>().is_err() {
                let known: Vec<&str> = ToolCapability::ALL.iter().map(|c| c.token()).collect();
                warnings.push(ConfigWarning {
                    field: "guard.denied_tools".into(),
                    message: format!("unknown tool token '{}'", token),
                    severity: WarningSeverity::Error,
                    hint: Some(format!("Valid tokens: {}", known.join(", "))),
                });
            }
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
