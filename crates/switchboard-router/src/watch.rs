use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use switchboard_core::{Result, SwitchboardError};

use crate::live::LiveRegistry;

/// Keeps the definition directories under watch. Dropping it stops the
/// watcher and the reload task.
pub struct DefinitionWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for DefinitionWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reload `live` from disk whenever its directories change.
///
/// Bursts of events are collapsed: the reload runs once no new event has
/// arrived for `debounce`. Must be called inside a tokio runtime.
pub fn watch(live: Arc<LiveRegistry>, debounce: Duration) -> Result<DefinitionWatcher> {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    let mut watcher = notify::recommended_watcher(move |res: std::result::Result<NotifyEvent, notify::Error>| {
        match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    let _ = tx.send(());
                }
            }
            Err(e) => {
                warn!(error = %e, "file watcher error");
            }
        }
    })
    .map_err(|e| SwitchboardError::Config(format!("failed to create file watcher: {}", e)))?;

    let mut watched = 0;
    for dir in live.dirs() {
        if !dir.is_dir() {
            debug!(?dir, "not watching missing definitions directory");
            continue;
        }
        // Recursive so that `<dir>/<name>/SKILL.md` edits are seen.
        watcher.watch(dir, RecursiveMode::Recursive).map_err(|e| {
            SwitchboardError::Config(format!("failed to watch {}: {}", dir.display(), e))
        })?;
        watched += 1;
    }
    info!(dirs = watched, debounce_ms = debounce.as_millis() as u64, "watching definition directories");

    let task = tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Wait for the burst to settle.
            loop {
                match tokio::time::timeout(debounce, rx.recv()).await {
                    Ok(Some(())) => continue,
                    Ok(None) => return,
                    Err(_) => break,
                }
            }
            info!("definition files changed, reloading");
            if let Ok(registry) = live.reload_from_disk().await {
                info!(count = registry.len(), "definitions hot-reloaded");
            }
        }
    });

    Ok(DefinitionWatcher {
        _watcher: watcher,
        task,
    })
}
