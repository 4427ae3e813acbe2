//! Configuration management with file persistence

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Flagdeck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file; empty means the default location
    pub database_path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// How long audit events are kept before `audit prune` removes them
    pub retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_path: String::new(),
                max_connections: 5,
            },
            audit: AuditConfig { retention_days: 90 },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("FLAGDECK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("flagdeck")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.max_connections == 0 {
            return Err(anyhow!("storage.max_connections must be at least 1"));
        }
        if self.audit.retention_days < 1 {
            return Err(anyhow!("audit.retention_days must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the database path, falling back to the default location
    pub fn database_path(&self) -> PathBuf {
        if self.storage.database_path.is_empty() {
            crate::storage::database::default_database_path()
        } else {
            PathBuf::from(&self.storage.database_path)
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "storage.database_path" => {
                if self.storage.database_path.is_empty() {
                    Ok(format!("(default: {})", self.database_path().display()))
                } else {
                    Ok(self.storage.database_path.clone())
                }
            }
            "storage.max_connections" => Ok(self.storage.max_connections.to_string()),
            "audit.retention_days" => Ok(self.audit.retention_days.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `flagdeck config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "storage.database_path" => {
                self.storage.database_path = value.to_string();
            }
            "storage.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.storage.max_connections = max;
            }
            "audit.retention_days" => {
                let days: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid retention_days value: {}", value))?;
                if days < 1 {
                    return Err(anyhow!("retention_days must be at least 1"));
                }
                self.audit.retention_days = days;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `flagdeck config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "storage.database_path",
            "storage.max_connections",
            "audit.retention_days",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
