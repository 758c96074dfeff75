//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/shelf/config.toml)
//! 3. Environment variables (SHELF_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "SHELF";

/// File name of the canonical library artifact
pub const LIBRARY_FILE_NAME: &str = "library.json";

/// How library files are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and rewrite the file in place
    Overwrite,
    /// Write a temp file, sync it, then rename over the target
    Atomic,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the library file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for backups (defaults to `<data_dir>/backups`)
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Write via temp file and rename instead of overwriting in place
    #[serde(default)]
    pub atomic_writes: bool,

    /// Log file (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: None,
            atomic_writes: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SHELF_DATA_DIR, SHELF_BACKUP_DIR, ...)
    /// 2. Config file (~/.config/shelf/config.toml or SHELF_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // SHELF_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // SHELF_BACKUP_DIR
        if let Ok(val) = std::env::var(format!("{}_BACKUP_DIR", ENV_PREFIX)) {
            self.backup_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // SHELF_ATOMIC_WRITES
        if let Ok(val) = std::env::var(format!("{}_ATOMIC_WRITES", ENV_PREFIX)) {
            self.atomic_writes = parse_bool(&val);
        }

        // SHELF_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a value by key, as used by `shelf config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => {
                if value.trim().is_empty() {
                    anyhow::bail!("data_dir cannot be empty");
                }
                self.data_dir = PathBuf::from(value);
            }
            "backup_dir" => {
                self.backup_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "atomic_writes" => {
                self.atomic_writes = value
                    .parse()
                    .context("Invalid value for atomic_writes. Use 'true' or 'false'.")?;
            }
            "log_file" => {
                self.log_file = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Valid keys: data_dir, backup_dir, atomic_writes, log_file",
                key
            ),
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SHELF_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelf")
            .join("config.toml")
    }

    /// Get the path to the canonical library file
    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE_NAME)
    }

    /// Get the directory backups are written to
    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }

    pub fn write_mode(&self) -> WriteMode {
        if self.atomic_writes {
            WriteMode::Atomic
        } else {
            WriteMode::Overwrite
        }
    }
}

fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SHELF_DATA_DIR",
        "SHELF_BACKUP_DIR",
        "SHELF_ATOMIC_WRITES",
        "SHELF_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.atomic_writes);
        assert!(config.backup_dir.is_none());
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("shelf"));
        assert_eq!(config.write_mode(), WriteMode::Overwrite);
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/shelf"),
            ..Config::default()
        };

        assert_eq!(config.library_path(), PathBuf::from("/data/shelf/library.json"));
        assert_eq!(config.backup_dir(), PathBuf::from("/data/shelf/backups"));

        let config = Config {
            backup_dir: Some(PathBuf::from("/elsewhere")),
            ..config
        };
        assert_eq!(config.backup_dir(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("SHELF_DATA_DIR", "/tmp/shelf-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/shelf-test"));
    }

    #[test]
    fn test_env_override_atomic_writes() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("SHELF_ATOMIC_WRITES", "true");
        config.apply_env_overrides();
        assert!(config.atomic_writes);
        assert_eq!(config.write_mode(), WriteMode::Atomic);

        env::set_var("SHELF_ATOMIC_WRITES", "0");
        config.apply_env_overrides();
        assert!(!config.atomic_writes);
    }

    #[test]
    fn test_env_override_backup_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHELF_BACKUP_DIR", "/backups");
        config.apply_env_overrides();
        assert_eq!(config.backup_dir, Some(PathBuf::from("/backups")));

        // Empty string clears it
        env::set_var("SHELF_BACKUP_DIR", "");
        config.apply_env_overrides();
        assert!(config.backup_dir.is_none());
    }

    #[test]
    fn test_set_keys() {
        let mut config = Config::default();
        config.set("atomic_writes", "true").unwrap();
        config.set("log_file", "/tmp/shelf.log").unwrap();
        config.set("backup_dir", "").unwrap();

        assert!(config.atomic_writes);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/shelf.log")));
        assert!(config.backup_dir.is_none());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        config.set("data_dir", "/data/shelf").unwrap();
        config.set("atomic_writes", "false").unwrap();

        assert!(config.set("data_dir", "").is_err());
        assert!(config.set("atomic_writes", "yes").is_err());
        assert!(config.set("atomic_writes", "").is_err());

        assert_eq!(config.data_dir, PathBuf::from("/data/shelf"));
        assert!(!config.atomic_writes);
    }

    #[test]
    fn test_serialization() {
        let config = Config {
            data_dir: PathBuf::from("/data/shelf"),
            backup_dir: Some(PathBuf::from("/data/backups")),
            atomic_writes: true,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("atomic_writes"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.backup_dir, config.backup_dir);
        assert!(parsed.atomic_writes);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            atomic_writes = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert!(config.atomic_writes);
        assert!(config.backup_dir.is_none());
    }

    #[test]
    fn test_load_from_path_and_save() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert!(loaded.data_dir.exists());
    }
}
