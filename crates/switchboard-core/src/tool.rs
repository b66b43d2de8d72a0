use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A side-effecting operation a definition may be permitted to request.
///
/// The vocabulary is closed: hosts map their concrete tools onto these
/// capabilities, and definitions declare the subset they need. Each variant
/// also accepts the tool-call name hosts commonly use for it (`Read`,
/// `Bash`, ...), so definitions written against those names load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCapability {
    #[serde(alias = "Read")]
    ReadFile,
    #[serde(alias = "Write")]
    WriteFile,
    #[serde(alias = "Edit")]
    EditFile,
    #[serde(alias = "Glob")]
    ListFiles,
    #[serde(alias = "Grep")]
    SearchContent,
    #[serde(alias = "Bash")]
    ExecuteShell,
    #[serde(alias = "WebFetch")]
    NetworkFetch,
    #[serde(alias = "WebSearch")]
    WebSearch,
    #[serde(alias = "Task")]
    SpawnAgent,
}

impl ToolCapability {
    /// Every capability, in declaration order.
    pub const ALL: [ToolCapability; 9] = [
        Self::ReadFile,
        Self::WriteFile,
        Self::EditFile,
        Self::ListFiles,
        Self::SearchContent,
        Self::ExecuteShell,
        Self::NetworkFetch,
        Self::WebSearch,
        Self::SpawnAgent,
    ];

    /// The canonical token, e.g. `"execute-shell"`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::ReadFile => "read-file",
            Self::WriteFile => "write-file",
            Self::EditFile => "edit-file",
            Self::ListFiles => "list-files",
            Self::SearchContent => "search-content",
            Self::ExecuteShell => "execute-shell",
            Self::NetworkFetch => "network-fetch",
            Self::WebSearch => "web-search",
            Self::SpawnAgent => "spawn-agent",
        }
    }

    /// The host tool-call name accepted as an alias for this capability.
    pub fn host_alias(&self) -> &'static str {
        match self {
            Self::ReadFile => "Read",
            Self::WriteFile => "Write",
            Self::EditFile => "Edit",
            Self::ListFiles => "Glob",
            Self::SearchContent => "Grep",
            Self::ExecuteShell => "Bash",
            Self::NetworkFetch => "WebFetch",
            Self::WebSearch => "WebSearch",
            Self::SpawnAgent => "Task",
        }
    }
}

impl fmt::Display for ToolCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A tool token that names no known capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool token '{0}'")]
pub struct UnknownToolToken(pub String);

impl FromStr for ToolCapability {
    type Err = UnknownToolToken;

    /// Resolve a canonical token or a host alias. Both are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|cap| cap.token() == s || cap.host_alias() == s)
            .ok_or_else(|| UnknownToolToken(s.to_string()))
    }
}

/// An ordered set of tool capabilities.
///
/// Ordering is by declaration order of [`ToolCapability`], so iteration and
/// display are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolSet(BTreeSet<ToolCapability>);

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse request-side tokens. Repeats collapse into one entry.
    pub fn parse_tokens<I, S>(tokens: I) -> Result<Self, UnknownToolToken>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| t.as_ref().parse::<ToolCapability>())
            .collect()
    }

    /// Insert a capability. Returns `false` if it was already present.
    pub fn insert(&mut self, cap: ToolCapability) -> bool {
        self.0.insert(cap)
    }

    pub fn contains(&self, cap: ToolCapability) -> bool {
        self.0.contains(&cap)
    }

    pub fn is_subset(&self, other: &ToolSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Capabilities in `self` that are not in `other`.
    pub fn difference(&self, other: &ToolSet) -> ToolSet {
        ToolSet(self.0.difference(&other.0).copied().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ToolCapability> + '_ {
        self.0.iter().copied()
    }

    /// Canonical tokens, in order.
    pub fn tokens(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.token()).collect()
    }
}

impl FromIterator<ToolCapability> for ToolSet {
    fn from_iter<T: IntoIterator<Item = ToolCapability>>(iter: T) -> Self {
        ToolSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ToolCapability; N]> for ToolSet {
    fn from(caps: [ToolCapability; N]) -> Self {
        caps.into_iter().collect()
    }
}

impl IntoIterator for ToolSet {
    type Item = ToolCapability;
    type IntoIter = std::collections::btree_set::IntoIter<ToolCapability>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(none)");
        }
        f.write_str(&self.tokens().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_and_aliases_resolve() {
        assert_eq!("execute-shell".parse::<ToolCapability>().unwrap(), ToolCapability::ExecuteShell);
        assert_eq!("Bash".parse::<ToolCapability>().unwrap(), ToolCapability::ExecuteShell);
        assert_eq!(" read-file ".parse::<ToolCapability>().unwrap(), ToolCapability::ReadFile);
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert!("Execute-Shell".parse::<ToolCapability>().is_err());
        assert!("bash".parse::<ToolCapability>().is_err());
    }

    #[test]
    fn every_alias_maps_to_one_capability() {
        for cap in ToolCapability::ALL {
            assert_eq!(cap.host_alias().parse::<ToolCapability>().unwrap(), cap);
            assert_eq!(cap.token().parse::<ToolCapability>().unwrap(), cap);
        }
    }

    #[test]
    fn serde_uses_canonical_tokens_and_accepts_aliases() {
        let json = serde_json::to_string(&ToolCapability::NetworkFetch).unwrap();
        assert_eq!(json, "\"network-fetch\"");
        let cap: ToolCapability = serde_json::from_str("\"WebFetch\"").unwrap();
        assert_eq!(cap, ToolCapability::NetworkFetch);
    }

    #[test]
    fn toolset_subset_and_difference() {
        let declared = ToolSet::from([ToolCapability::ReadFile, ToolCapability::ExecuteShell]);
        let wanted = ToolSet::from([ToolCapability::ExecuteShell]);
        assert!(wanted.is_subset(&declared));

        let extra = ToolSet::from([ToolCapability::ReadFile, ToolCapability::NetworkFetch]);
        let missing = extra.difference(&declared);
        assert_eq!(missing, ToolSet::from([ToolCapability::NetworkFetch]));
    }

    #[test]
    fn toolset_display_is_ordered() {
        let set = ToolSet::from([ToolCapability::SpawnAgent, ToolCapability::ReadFile]);
        assert_eq!(set.to_string(), "read-file, spawn-agent");
        assert_eq!(ToolSet::new().to_string(), "(none)");
    }

    #[test]
    fn parse_tokens_reports_unknown() {
        let err = ToolSet::parse_tokens(["read-file", "teleport"]).unwrap_err();
        assert_eq!(err, UnknownToolToken("teleport".into()));
    }
}
