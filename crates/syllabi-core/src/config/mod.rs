use crate::error::{Result, SyllabiError};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyllabiConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Custom path for SQLite database. Defaults to `~/.config/syllabi/syllabi.db`.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: None,
            base_url: None,
            env_var: None,
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_web_host")]
    pub host: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            host: default_web_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Valid storage backend names.
pub const VALID_STORAGE_BACKENDS: &[&str] = &["sqlite", "memory"];

/// Valid LLM provider names. `offline` needs no key or network.
pub const VALID_LLM_PROVIDERS: &[&str] = &["gemini", "openai", "anthropic", "ollama", "offline"];

/// `llm.model` value that lets the provider pick: Gemini lists its models and
/// prefers a flash one, the others use a fixed default.
pub const AUTO_MODEL: &str = "auto";

/// Upper bound for `history.max_entries`.
pub const MAX_HISTORY_ENTRIES: usize = 200;

// -- Defaults --

fn default_storage_backend() -> String {
    "sqlite".to_string()
}
fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_llm_model() -> String {
    AUTO_MODEL.to_string()
}
fn default_llm_max_tokens() -> usize {
    8192
}
fn default_llm_temperature() -> f32 {
    0.7
}
fn default_llm_timeout_secs() -> u64 {
    120
}
fn default_web_port() -> u16 {
    37740
}
fn default_web_host() -> String {
    "127.0.0.1".to_string()
}
fn default_max_entries() -> usize {
    20
}

impl SyllabiConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/syllabi/config.toml (global)
    /// 2. .syllabi/config.toml (project)
    /// 3. .syllabi/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Layer 1: Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        // Layer 2: Project config
        if let Some(dir) = project_dir {
            let project_config = dir.join(".syllabi").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            // Layer 3: Local config (gitignored)
            let local_config = dir.join(".syllabi").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| SyllabiError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| SyllabiError::Config(e.to_string()))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Load with defaults only (no files).
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate config values, clamping out-of-range values and logging warnings.
    /// This is lenient: it fixes values rather than rejecting the config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !VALID_STORAGE_BACKENDS.contains(&self.storage.backend.as_str()) {
            warnings.push(format!(
                "unknown storage backend '{}', valid: {}",
                self.storage.backend,
                VALID_STORAGE_BACKENDS.join(", ")
            ));
        }

        let provider = self.llm.provider.as_str();
        if !VALID_LLM_PROVIDERS.contains(&provider) && provider != "claude" {
            warnings.push(format!(
                "unknown LLM provider '{}', valid: {}",
                self.llm.provider,
                VALID_LLM_PROVIDERS.join(", ")
            ));
        }

        if self.llm.max_tokens == 0 {
            warnings.push("llm.max_tokens = 0, setting to 1024".to_string());
            self.llm.max_tokens = 1024;
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            let clamped = self.llm.temperature.clamp(0.0, 2.0);
            warnings.push(format!(
                "llm.temperature = {} out of range [0.0, 2.0], clamping",
                self.llm.temperature
            ));
            self.llm.temperature = clamped;
        }

        if self.llm.timeout_secs == 0 {
            warnings.push("llm.timeout_secs = 0, setting to 1".to_string());
            self.llm.timeout_secs = 1;
        }

        if self.history.max_entries == 0 {
            warnings.push("history.max_entries = 0, setting to 1".to_string());
            self.history.max_entries = 1;
        } else if self.history.max_entries > MAX_HISTORY_ENTRIES {
            warnings.push(format!(
                "history.max_entries = {} exceeds {MAX_HISTORY_ENTRIES}, clamping",
                self.history.max_entries
            ));
            self.history.max_entries = MAX_HISTORY_ENTRIES;
        }

        // Log warnings via tracing (if subscriber is set up)
        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

/// `~/.config/syllabi`, where the global config and default database live.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("syllabi"))
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Resolve an API key: check config field first, then the configured
/// environment variable, then the provider's default one.
pub fn resolve_api_key(config: &LlmConfig, default_env_var: &str) -> Result<String> {
    if let Some(ref key) = config.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    let env_var_name = config.env_var.as_deref().unwrap_or(default_env_var);

    match std::env::var(env_var_name) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(SyllabiError::Config(format!(
            "{} LLM provider requires an API key (set llm.api_key or {})",
            config.provider, env_var_name
        ))),
    }
}
