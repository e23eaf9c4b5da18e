//! Provider configuration management
//!
//! Configuration is read from an optional TOML file, then overridden by
//! environment variables. All values are validated before a provider is
//! created.

use crate::core::constants::{defaults, env};
use crate::models::inference::ProviderKwargs;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlamaCppSection {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_temperature() -> f32 {
    defaults::TEMPERATURE
}

fn default_max_tokens() -> u32 {
    defaults::MAX_TOKENS
}

fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT
}

fn default_max_workers() -> usize {
    defaults::MAX_WORKERS
}

fn default_log_level() -> String {
    defaults::LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub llamacpp: Option<LlamaCppSection>,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Provider and logging configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the llama.cpp server
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Model to request; the first served model when unset
    pub model_id: Option<String>,

    pub system_prompt: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Concurrent requests per batch
    pub max_workers: usize,

    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

impl Config {
    fn from_toml(config: TomlConfig) -> Self {
        let section = config.llamacpp.unwrap_or_else(|| LlamaCppSection {
            temperature: defaults::TEMPERATURE,
            max_tokens: defaults::MAX_TOKENS,
            request_timeout: defaults::REQUEST_TIMEOUT,
            max_workers: defaults::MAX_WORKERS,
            ..Default::default()
        });

        Config {
            api_key: section.api_key.filter(|k| !k.is_empty()),
            base_url: section
                .base_url
                .unwrap_or_else(|| defaults::BASE_URL.to_string()),
            model_id: section.model_id.filter(|m| !m.is_empty()),
            system_prompt: section.system_prompt.unwrap_or_default(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
            request_timeout: section.request_timeout,
            max_workers: section.max_workers,
            log_level: config.logging.log_level,
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or a value is
    /// out of range.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read configuration file")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        let config = Self::from_toml(config);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `CONFIG_PATH` (default `config.toml`) and
    /// the environment
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn from_env() -> Result<Self> {
        let config_path = std::env::var(env::CONFIG_PATH)
            .unwrap_or_else(|_| defaults::CONFIG_FILE.to_string());
        Self::load(Path::new(&config_path))
    }

    /// Load `path` if it exists, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `LLAMACPP_API_KEY`, `LLAMACPP_API_BASE` and `LOG_LEVEL`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(env::API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = Some(api_key);
        }
        if let Some(base_url) = lookup(env::API_BASE).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(log_level) = lookup(env::LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log_level = log_level;
        }
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be between 0.0 and 2.0, got {}", self.temperature);
        }
        if self.max_tokens == 0 {
            bail!("max_tokens must be greater than 0");
        }
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.request_timeout == 0 {
            bail!("request_timeout must be greater than 0");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!("base_url must start with http:// or https://, got {}", self.base_url);
        }
        Ok(())
    }

    /// Provider construction arguments for this configuration
    pub fn provider_kwargs(&self) -> ProviderKwargs {
        ProviderKwargs {
            model_id: self.model_id.clone(),
            api_key: self.api_key.clone(),
            base_url: Some(self.base_url.clone()),
            system_prompt: Some(self.system_prompt.clone()),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            request_timeout: Some(self.request_timeout),
            max_workers: Some(self.max_workers),
            ..Default::default()
        }
    }
}
