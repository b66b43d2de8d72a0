use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use switchboard_core::{Result, SwitchboardError};

use crate::schema::SwitchboardConfig;

/// Loads and reloads the Switchboard configuration.
pub struct ConfigLoader {
    config: Arc<RwLock<SwitchboardConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > SWITCHBOARD_CONFIG env > ~/.switchboard/switchboard.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("SWITCHBOARD_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".switchboard")
            .join("switchboard.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = Self::read(&config_path, |key| std::env::var(key).ok())?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// Read, override, validate and expand one config file.
    ///
    /// A missing file yields the defaults. `env` resolves override variables.
    pub fn read<F>(config_path: &Path, env: F) -> Result<SwitchboardConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(config_path)?;
            toml::from_str::<SwitchboardConfig>(&raw).map_err(|e| {
                SwitchboardError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            SwitchboardConfig::default()
        };

        let mut config = Self::apply_env_overrides(config, env);

        // Log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(SwitchboardError::Config(e));
            }
        }

        config.definitions.dirs = config
            .definitions
            .dirs
            .iter()
            .map(|d| expand_home(d))
            .collect();
        Ok(config)
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> SwitchboardConfig {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<SwitchboardConfig>> {
        Arc::clone(&self.config)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (SWITCHBOARD_LOG_LEVEL, SWITCHBOARD_MIN_SCORE, etc.)
    fn apply_env_overrides<F>(mut config: SwitchboardConfig, env: F) -> SwitchboardConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env("SWITCHBOARD_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = env("SWITCHBOARD_DEFINITION_DIRS") {
            config.definitions.dirs = std::env::split_paths(&v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(v) = env("SWITCHBOARD_MIN_SCORE") {
            match v.parse::<f64>() {
                Ok(score) => config.matching.min_score = score,
                Err(_) => warn!(value = %v, "ignoring unparseable SWITCHBOARD_MIN_SCORE"),
            }
        }
        if let Some(v) = env("SWITCHBOARD_FALLBACK_TIER") {
            config.definitions.fallback_tier = v;
        }
        config
    }

    /// Reload the config from disk. On failure the current config is kept.
    pub fn reload(&self) -> Result<()> {
        if !self.config_path.exists() {
            return Err(SwitchboardError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::read(&self.config_path, |key| std::env::var(key).ok())?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
