//! Configuration for the companion agent
//!
//! Configuration file: ~/.config/lucy/config.toml (or platform equivalent)

use crate::error::{BondError, Result};
use crate::scheduler::DEFAULT_UPDATE_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level config file layout
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub bond: BondConfig,
}

/// Settings for a bond session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondConfig {
    /// Name the agent addresses the user by
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Where the bond document lives (`~` is expanded)
    #[serde(default = "default_memory_file")]
    pub memory_file: PathBuf,

    /// Seconds between self-updates
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// End the session when a turn fails, instead of skipping the turn
    #[serde(default = "default_abort_on_turn_failure")]
    pub abort_on_turn_failure: bool,
}

fn default_user_name() -> String {
    "Adam".to_string()
}

fn default_memory_file() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lucy")
        .join("memory.json")
}

fn default_update_interval_secs() -> u64 {
    DEFAULT_UPDATE_INTERVAL.as_secs()
}

fn default_abort_on_turn_failure() -> bool {
    true
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            memory_file: default_memory_file(),
            update_interval_secs: default_update_interval_secs(),
            abort_on_turn_failure: default_abort_on_turn_failure(),
        }
    }
}

impl BondConfig {
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn with_memory_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.memory_file = path.into();
        self
    }

    pub fn with_update_interval(mut self, secs: u64) -> Self {
        self.update_interval_secs = secs;
        self
    }

    pub fn with_abort_on_turn_failure(mut self, abort: bool) -> Self {
        self.abort_on_turn_failure = abort;
        self
    }

    /// Memory file path with a leading `~` expanded
    pub fn memory_path(&self) -> PathBuf {
        expand_home(&self.memory_file)
    }

    /// Interval between self-updates, never zero
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs.max(1))
    }

    /// Load from the default config file; a missing file yields defaults
    pub fn load() -> Result<Self> {
        match ConfigFile::config_path() {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BondError::storage(path, e))?;

        let file: ConfigFile = toml::from_str(&content).map_err(|e| BondError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(file.bond)
    }
}

impl ConfigFile {
    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lucy").join("config.toml"))
    }

    /// Write a commented default configuration file
    pub fn create_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(BondError::Config {
                path: path.to_path_buf(),
                message: "config file already exists".to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BondError::storage(parent, e))?;
        }

        let default_config = r#"# lucy configuration
# Location: ~/.config/lucy/config.toml

[bond]
# Name Lucy calls you
user_name = "Adam"

# Where the bond is stored (defaults to the per-user data directory)
# memory_file = "~/lucy_data/memory.json"

# Seconds between self-updates
update_interval_secs = 3600

# End the session when a turn fails (false skips the failed turn)
abort_on_turn_failure = true
"#;

        fs::write(path, default_config).map_err(|e| BondError::storage(path, e))
    }
}

/// Expand a leading `~` against the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BondConfig::default();
        assert_eq!(config.user_name, "Adam");
        assert_eq!(config.update_interval_secs, 3600);
        assert!(config.abort_on_turn_failure);
        assert!(config.memory_file.ends_with("lucy/memory.json"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[bond]
user_name = "Eve"
update_interval_secs = 60
"#;

        let file: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(file.bond.user_name, "Eve");
        assert_eq!(file.bond.update_interval_secs, 60);
        assert!(file.bond.abort_on_turn_failure);
        assert_eq!(file.bond.memory_file, default_memory_file());
    }

    #[test]
    fn test_empty_config() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file.bond.user_name, "Adam");
    }

    #[test]
    fn test_builder() {
        let config = BondConfig::default()
            .with_user_name("Eve")
            .with_memory_file("/tmp/bond.json")
            .with_update_interval(0)
            .with_abort_on_turn_failure(false);

        assert_eq!(config.user_name, "Eve");
        assert_eq!(config.memory_path(), PathBuf::from("/tmp/bond.json"));
        assert_eq!(config.update_interval(), Duration::from_secs(1));
        assert!(!config.abort_on_turn_failure);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        assert_eq!(expand_home(Path::new("rel/path")), PathBuf::from("rel/path"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/lucy_data/memory.json")),
                home.join("lucy_data/memory.json")
            );
            assert_eq!(expand_home(Path::new("~")), home);
        }
    }

    #[test]
    fn test_load_from_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = BondConfig::load_from(&path).unwrap();
        assert_eq!(config.user_name, "Adam");

        fs::write(&path, "[bond\nuser_name = ").unwrap();
        assert!(matches!(
            BondConfig::load_from(&path),
            Err(BondError::Config { .. })
        ));
    }

    #[test]
    fn test_create_default_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lucy").join("config.toml");

        ConfigFile::create_default(&path).unwrap();
        let config = BondConfig::load_from(&path).unwrap();
        assert_eq!(config.user_name, "Adam");
        assert_eq!(config.update_interval_secs, 3600);

        assert!(ConfigFile::create_default(&path).is_err());
    }
}
