use futures::{StreamExt, TryStreamExt, stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use switchboard_core::{DefinitionKind, LoadError};

use crate::parser::DefinitionSource;

const SKILL_FILE: &str = "SKILL.md";

/// Collect definition sources from the given directories.
///
/// Each directory contributes, in path order:
/// - `<dir>/*.md`, with the kind inferred from the directory name
///   (`commands` → command, `skills` → skill, otherwise agent);
/// - `<dir>/<name>/SKILL.md` as skills.
///
/// `README.md` and dot-files are ignored. Directories that do not exist are
/// skipped. Files are read concurrently, up to `concurrency` at a time, but
/// returned in discovery order.
pub async fn discover(dirs: &[PathBuf], concurrency: usize) -> Result<Vec<DefinitionSource>, LoadError> {
    let mut candidates = Vec::new();
    for dir in dirs {
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            debug!(?dir, "definitions directory does not exist, skipping");
            continue;
        }
        candidates.extend(scan_dir(dir).await?);
    }

    let sources: Vec<DefinitionSource> = stream::iter(candidates)
        .map(|(path, kind)| async move {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| discovery_error(&path, e))?;
            Ok::<_, LoadError>(DefinitionSource::new(path.display().to_string(), text).with_kind(kind))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    info!(count = sources.len(), dirs = dirs.len(), "discovered definition sources");
    Ok(sources)
}

/// Candidate files directly under `dir`, sorted by path.
async fn scan_dir(dir: &Path) -> Result<Vec<(PathBuf, DefinitionKind)>, LoadError> {
    let dir_kind = kind_for_dir(dir);
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| discovery_error(dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| discovery_error(dir, e))? {
        paths.push(entry.path());
    }
    paths.sort();

    let mut found = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| discovery_error(&path, e))?;
        if meta.is_dir() {
            let skill_md = path.join(SKILL_FILE);
            if tokio::fs::metadata(&skill_md).await.is_ok_and(|m| m.is_file()) {
                found.push((skill_md, DefinitionKind::Skill));
            }
        } else if path.extension().is_some_and(|e| e == "md") && name != "README.md" {
            let kind = if name == SKILL_FILE {
                DefinitionKind::Skill
            } else {
                dir_kind
            };
            found.push((path, kind));
        }
    }

    debug!(?dir, count = found.len(), "scanned definitions directory");
    Ok(found)
}

fn kind_for_dir(dir: &Path) -> DefinitionKind {
    match dir.file_name().and_then(|n| n.to_str()) {
        Some("commands") => DefinitionKind::Command,
        Some("skills") => DefinitionKind::Skill,
        _ => DefinitionKind::Agent,
    }
}

fn discovery_error(path: &Path, err: std::io::Error) -> LoadError {
    LoadError::Discovery {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
