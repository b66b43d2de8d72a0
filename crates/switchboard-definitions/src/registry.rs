use futures::{StreamExt, TryStreamExt, stream};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use switchboard_core::{
    AgentDefinition, DefinitionId, InvalidPolicy, LoadError, NotFound, ParseError,
};

use crate::parser::{DefinitionParser, DefinitionSource, ParseOptions};

/// Settings for building a [`Registry`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub parse: ParseOptions,
    pub on_invalid: InvalidPolicy,
    /// Upper bound on sources parsed at once by [`Registry::load_concurrent`].
    pub concurrency: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            on_invalid: InvalidPolicy::Abort,
            concurrency: 8,
        }
    }
}

/// A source left out of the registry under [`InvalidPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub origin: String,
    pub error: ParseError,
}

/// An immutable, validated set of definitions.
///
/// Either fully built or not built at all: every constructor returns a
/// `Result`, and nothing is exposed until accumulation succeeds. Ids are
/// unique; [`Registry::all`] yields definitions in load order.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Vec<Arc<AgentDefinition>>,
    index: HashMap<DefinitionId, usize>,
    skipped: Vec<SkippedSource>,
}

impl Registry {
    /// A registry with no definitions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and register every source, in order.
    pub fn load<I>(sources: I, options: &LoadOptions) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = DefinitionSource>,
    {
        let parser = DefinitionParser::new(options.parse.clone());
        let parsed = sources.into_iter().map(|source| {
            let result = parser.parse_source(&source);
            (source.origin, result)
        });
        Self::accumulate(parsed, options.on_invalid)
    }

    /// Like [`Registry::load`], but parses on blocking worker threads.
    ///
    /// Results are accumulated in input order, so the outcome (including
    /// which error is reported) matches the sequential path.
    pub async fn load_concurrent(
        sources: Vec<DefinitionSource>,
        options: &LoadOptions,
    ) -> Result<Self, LoadError> {
        let parser = Arc::new(DefinitionParser::new(options.parse.clone()));
        let parsed: Vec<(String, Result<AgentDefinition, ParseError>)> = stream::iter(sources)
            .map(|source| {
                let parser = Arc::clone(&parser);
                tokio::task::spawn_blocking(move || {
                    let result = parser.parse_source(&source);
                    (source.origin, result)
                })
            })
            .buffered(options.concurrency.max(1))
            .map_err(|e| LoadError::Worker(e.to_string()))
            .try_collect()
            .await?;

        Self::accumulate(parsed.into_iter(), options.on_invalid)
    }

    /// Build a registry from already-constructed definitions.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = AgentDefinition>,
    {
        let parsed = definitions
            .into_iter()
            .map(|def| (def.origin().to_string(), Ok(def)));
        Self::accumulate(parsed, InvalidPolicy::Abort)
    }

    fn accumulate<I>(parsed: I, on_invalid: InvalidPolicy) -> Result<Self, LoadError>
    where
        I: Iterator<Item = (String, Result<AgentDefinition, ParseError>)>,
    {
        let mut registry = Self::empty();

        for (origin, result) in parsed {
            let def = match result {
                Ok(def) => def,
                Err(error) => match on_invalid {
                    InvalidPolicy::Abort => return Err(LoadError::Parse { origin, error }),
                    InvalidPolicy::Skip => {
                        warn!(%origin, %error, "skipping invalid definition");
                        registry.skipped.push(SkippedSource { origin, error });
                        continue;
                    }
                },
            };

            if let Some(&existing) = registry.index.get(def.id()) {
                let first = registry.definitions[existing].origin().to_string();
                return Err(LoadError::DuplicateId {
                    id: def.id().clone(),
                    first,
                    second: def.origin().to_string(),
                });
            }

            debug!(id = %def.id(), %origin, "registered definition");
            registry
                .index
                .insert(def.id().clone(), registry.definitions.len());
            registry.definitions.push(Arc::new(def));
        }

        info!(
            count = registry.definitions.len(),
            skipped = registry.skipped.len(),
            "definition registry loaded"
        );
        Ok(registry)
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> Result<&Arc<AgentDefinition>, NotFound> {
        self.index
            .get(id)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All definitions, in load order.
    pub fn all(&self) -> &[Arc<AgentDefinition>] {
        &self.definitions
    }

    pub fn ids(&self) -> impl Iterator<Item = &DefinitionId> {
        self.definitions.iter().map(|d| d.id())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Sources dropped under [`InvalidPolicy::Skip`].
    pub fn skipped(&self) -> &[SkippedSource] {
        &self.skipped
    }

    /// Render the `<available_definitions>` block a host can place in a
    /// system prompt. Bodies are not included.
    pub fn catalog(&self) -> Option<String> {
        if self.definitions.is_empty() {
            return None;
        }

        let mut block = String::from("<available_definitions>\n");
        for def in &self.definitions {
            block.push_str(&format!(
                "<definition>\n  <id>{}</id>\n  <kind>{}</kind>\n  <model>{}</model>\n  <description>{}</description>\n</definition>\n",
                def.id(),
                def.kind(),
                def.model_tier(),
                def.trigger_description(),
            ));
        }
        block.push_str("</available_definitions>");

        Some(block)
    }
}
