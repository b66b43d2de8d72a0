use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use switchboard_core::LoadError;
use switchboard_definitions::{DefinitionSource, LoadOptions, Registry, discover};

/// Holder of the current registry.
///
/// Readers take an `Arc<Registry>` snapshot and keep using it for as long
/// as they like. A reload builds a complete new registry first and only
/// then swaps the pointer, so a reader sees either the old set or the new
/// one in full. A failed reload leaves the current registry in place.
/// Reloads run one at a time, so an older scan can never land after a
/// newer one.
pub struct LiveRegistry {
    current: RwLock<Arc<Registry>>,
    reloading: Mutex<()>,
    options: LoadOptions,
    dirs: Vec<PathBuf>,
}

impl LiveRegistry {
    pub fn new(registry: Registry, options: LoadOptions, dirs: Vec<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
            reloading: Mutex::new(()),
            options,
            dirs,
        }
    }

    /// Discover and load definitions from `dirs`.
    pub async fn load(options: LoadOptions, dirs: Vec<PathBuf>) -> Result<Self, LoadError> {
        let sources = discover(&dirs, options.concurrency).await?;
        let registry = Registry::load_concurrent(sources, &options).await?;
        info!(count = registry.len(), skipped = registry.skipped().len(), "registry loaded");
        Ok(Self::new(registry, options, dirs))
    }

    /// The registry as of now.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.read().clone()
    }

    /// Swap in `registry`, returning the one it replaced.
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        let next = Arc::new(registry);
        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&next));
        info!(previous = previous.len(), current = next.len(), "registry swapped");
        previous
    }

    /// Build a registry from `sources` and swap it in if it loads.
    pub async fn reload(&self, sources: Vec<DefinitionSource>) -> Result<Arc<Registry>, LoadError> {
        let _guard = self.reloading.lock().await;
        self.load_and_swap(sources).await
    }

    /// Re-scan the configured directories and reload.
    pub async fn reload_from_disk(&self) -> Result<Arc<Registry>, LoadError> {
        let _guard = self.reloading.lock().await;
        let sources = match discover(&self.dirs, self.options.concurrency).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "definition discovery failed, keeping current registry");
                return Err(e);
            }
        };
        self.load_and_swap(sources).await
    }

    async fn load_and_swap(&self, sources: Vec<DefinitionSource>) -> Result<Arc<Registry>, LoadError> {
        match Registry::load_concurrent(sources, &self.options).await {
            Ok(registry) => {
                self.replace(registry);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(error = %e, current = self.current.read().len(), "reload failed, keeping current registry");
                Err(e)
            }
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}
