use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "kvmigrate.toml";

/// Used when neither the flag, the config file nor `REDIS_URL` provide a URL.
const FALLBACK_REDIS_URL: &str = "redis://127.0.0.1/";

/// Configuration stored in kvmigrate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvmigrateConfig {
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Key prefix of the application data migrations operate on
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    "app".to_string()
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub redis_url: String,
    pub prefix: String,
}

impl Settings {
    /// Load `path` if it exists and apply the command-line override.
    pub fn load(path: &Path, redis_url_override: Option<String>) -> Result<Self> {
        let config = KvmigrateConfig::load(path)?;
        let redis_url = match redis_url_override {
            Some(url) => url,
            None => expand_env(&config.redis.url)?,
        };

        Ok(Self {
            redis_url,
            prefix: config.provider.prefix,
        })
    }
}

impl KvmigrateConfig {
    /// Read the configuration file, falling back to defaults when it is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no configuration file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Expand a `${VAR}` value. The default `${REDIS_URL}` falls back to a local
/// server when unset; any other variable must exist.
fn expand_env(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        match std::env::var(var_name) {
            Ok(expanded) => Ok(expanded),
            Err(_) if var_name == "REDIS_URL" => Ok(FALLBACK_REDIS_URL.to_string()),
            Err(_) => anyhow::bail!("Environment variable {var_name} not set"),
        }
    } else {
        Ok(value.to_string())
    }
}
