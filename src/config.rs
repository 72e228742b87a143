use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{LogConfig, LogLevel};

/// Secret used when neither the config file nor `JWT_SECRET` provides one
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where users, results, plans and workouts are kept
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Password hashing and session tokens
    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file
    pub path: PathBuf,

    /// Keep everything in memory for the life of the process
    pub in_memory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,

    /// Session token lifetime
    pub token_ttl_hours: i64,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/happyfeet.db"),
            in_memory: false,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: 10,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: ConfigMetadata::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".happyfeet")
            .join("config.toml")
    }

    /// Load `path`, or defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `JWT_SECRET`, `HAPPYFEET_DB` and `HAPPYFEET_LOG` from the environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(db) = lookup("HAPPYFEET_DB").filter(|s| !s.is_empty()) {
            if db == ":memory:" {
                self.database.in_memory = true;
            } else {
                self.database.path = PathBuf::from(db);
            }
        }
        if let Some(level) = lookup("HAPPYFEET_LOG").filter(|s| !s.is_empty()) {
            self.logging.level = level
                .parse::<LogLevel>()
                .map_err(|e| anyhow!("HAPPYFEET_LOG: {}", e))?;
        }
        Ok(())
    }

    /// Whether the signing secret is still the built-in placeholder
    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Value at a dotted key such as `auth.token_ttl_hours`
    pub fn get(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self).context("Failed to serialize configuration")?;

        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }

        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a dotted key. The value is parsed as a bool or number when it looks like one.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self).context("Failed to serialize configuration")?;

        let parts: Vec<&str> = key.split('.').collect();
        let (leaf, path) = match parts.split_last() {
            Some((leaf, path)) if !leaf.is_empty() => (*leaf, path),
            _ => bail!("Unknown configuration key: {}", key),
        };

        let mut table = &mut root;
        for part in path {
            table = table
                .get_mut(*part)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }
        let table = table
            .as_table_mut()
            .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        if !table.contains_key(leaf) && leaf != "file_path" {
            bail!("Unknown configuration key: {}", key);
        }
        table.insert(leaf.to_string(), parse_toml_scalar(value));

        let updated: AppConfig = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, value))?;
        *self = updated;
        Ok(())
    }

    /// Every leaf setting as `(dotted key, value)`, secrets masked
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let root = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        let mut entries = Vec::new();
        flatten("", &root, &mut entries);
        for (key, value) in entries.iter_mut() {
            if key == "auth.jwt_secret" {
                *value = "********".to_string();
            }
        }
        Ok(entries)
    }
}

fn parse_toml_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, out);
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
        assert_eq!(deserialized.auth.token_ttl_hours, 24);
        assert_eq!(deserialized.auth.bcrypt_cost, 10);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.database.path = PathBuf::from("/tmp/runs.db");
        config.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.database.path, PathBuf::from("/tmp/runs.db"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(temp_dir.path().join("absent.toml")).unwrap();
        assert!(config.uses_default_secret());
        assert_eq!(config.database.path, PathBuf::from("./data/happyfeet.db"));
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[metadata]
version = "0.1.0"
created_at = "2025-01-01T00:00:00Z"
updated_at = "2025-01-01T00:00:00Z"

[auth]
jwt_secret = "from-file"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(!config.database.in_memory);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("JWT_SECRET", "env-secret"),
            ("HAPPYFEET_DB", ":memory:"),
            ("HAPPYFEET_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert!(config.database.in_memory);
        assert_eq!(config.logging.level, LogLevel::Debug);

        let mut config = AppConfig::default();
        let bad = config.apply_overrides_from(|k| (k == "HAPPYFEET_LOG").then(|| "loud".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_get_and_set_dotted_keys() {
        let mut config = AppConfig::default();
        assert_eq!(config.get("auth.token_ttl_hours").unwrap(), "24");

        config.set("auth.token_ttl_hours", "48").unwrap();
        assert_eq!(config.auth.token_ttl_hours, 48);

        config.set("logging.format", "json").unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);

        config.set("database.path", "runs.db").unwrap();
        assert_eq!(config.get("database.path").unwrap(), "runs.db");

        assert!(config.set("auth.token_ttl_hours", "soon").is_err());
        assert!(config.set("auth.nonexistent", "1").is_err());
        assert!(config.get("nope.key").is_err());
        assert_eq!(config.auth.token_ttl_hours, 48);
    }

    #[test]
    fn test_entries_mask_secret() {
        let config = AppConfig::default();
        let entries = config.entries().unwrap();
        let secret = entries.iter().find(|(k, _)| k == "auth.jwt_secret").unwrap();
        assert_eq!(secret.1, "********");
        assert!(entries.iter().any(|(k, _)| k == "database.in_memory"));
    }
}
