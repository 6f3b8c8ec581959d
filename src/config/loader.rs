//! Configuration loader with tier-based merging.
//!
//! Tiers, lowest to highest: embedded defaults, project `config.yaml`, user
//! `config.yaml`, environment variables.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "TASK_MANAGER_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "TASK_MANAGER_DB_PATH";
pub const ENV_HOST: &str = "TASK_MANAGER_HOST";
pub const ENV_PORT: &str = "TASK_MANAGER_PORT";
pub const ENV_PROJECT_DIR: &str = "TASK_MANAGER_PROJECT_DIR";
pub const ENV_USER_DIR: &str = "TASK_MANAGER_USER_DIR";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Project dir: `$TASK_MANAGER_PROJECT_DIR` or `./task-manager`.
    /// User dir: `$TASK_MANAGER_USER_DIR` or `~/.task-manager`.
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-manager")));

        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-manager")));

        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Environment-variable overrides, captured once.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub config_path: Option<String>,
    pub db_path: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            config_path: std::env::var(ENV_CONFIG_PATH).ok(),
            db_path: std::env::var(ENV_DB_PATH).ok(),
            host: std::env::var(ENV_HOST).ok(),
            port: std::env::var(ENV_PORT).ok(),
        }
    }

    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(ref db_path) = self.db_path {
            config.server.db_path = PathBuf::from(db_path);
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref port) = self.port {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", ENV_PORT, port))?;
        }
        Ok(())
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority config file that contributed, if any.
    config_path: Option<PathBuf>,
}

/// Read a YAML tier as JSON. Missing files are skipped; unreadable ones are logged and skipped.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(tier = %tier, path = %path.display(), error = %e, "Could not read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(tier = %tier, path = %path.display(), "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(tier = %tier, path = %path.display(), error = %e, "Ignoring malformed config file");
            None
        }
    }
}

impl ConfigLoader {
    /// Load configuration from all tiers using the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), &EnvOverrides::from_env())
    }

    /// Load configuration with explicit paths and overrides.
    pub fn load_with(paths: ConfigPaths, env: &EnvOverrides) -> Result<Self> {
        // An explicit config file replaces the file tiers.
        if let Some(ref explicit) = env.config_path {
            let path = PathBuf::from(explicit);
            let mut config = Config::load(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            env.apply(&mut config)?;
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        if let Some(ref dir) = paths.project_dir {
            let file = dir.join("config.yaml");
            if let Some(value) = read_tier(&file, ConfigTier::Project) {
                tiers.push(value);
                config_path = Some(file);
            }
        }

        if let Some(ref dir) = paths.user_dir {
            let file = dir.join("config.yaml");
            if let Some(value) = read_tier(&file, ConfigTier::User) {
                tiers.push(value);
                config_path = Some(file);
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))
            .context("Merged configuration is invalid")?;
        env.apply(&mut config)?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}
