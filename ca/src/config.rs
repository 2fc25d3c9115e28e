//! codeagent configuration types and loading
//!
//! Configuration is read exactly once at startup: a YAML file (if any),
//! then environment overrides, then validation. The resulting [`Config`] is
//! immutable and handed to the sandbox, registry and loop constructors.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model provider configuration
    pub llm: LlmConfig,

    /// Read, round and subprocess limits
    pub limits: ExecutionLimits,

    /// Working directory and script runner
    pub sandbox: SandboxConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API credential is present and the limits are usable.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.llm.get_api_key()?;

        if self.limits.max_file_read_chars == 0 {
            return Err(eyre::eyre!("max-file-read-chars must be greater than 0"));
        }
        if self.limits.max_conversation_rounds == 0 {
            return Err(eyre::eyre!("max-conversation-rounds must be greater than 0"));
        }
        if self.limits.subprocess_timeout_secs == 0 {
            return Err(eyre::eyre!("subprocess-timeout-secs must be greater than 0"));
        }
        if self.sandbox.interpreter.trim().is_empty() {
            return Err(eyre::eyre!("sandbox interpreter must not be empty"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .codeagent.yml
        let local_config = PathBuf::from(".codeagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/codeagent/codeagent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("codeagent").join("codeagent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply the process environment on top of the loaded values
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Recognised keys: `MAX_CHARS`, `MAX_CONV_ROUNDS`, `WORKING_DIR`,
    /// `SUBPROCESS_TIMEOUT_SECS`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_var(&lookup, "MAX_CHARS")? {
            self.limits.max_file_read_chars = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_CONV_ROUNDS")? {
            self.limits.max_conversation_rounds = value;
        }
        if let Some(value) = parse_var(&lookup, "SUBPROCESS_TIMEOUT_SECS")? {
            self.limits.subprocess_timeout_secs = value;
        }
        if let Some(dir) = lookup("WORKING_DIR").filter(|d| !d.trim().is_empty()) {
            self.sandbox.working_dir = PathBuf::from(dir);
        }
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .map_err(|e| eyre::eyre!("Invalid {} value '{}': {}", key, raw, e))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-001".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

/// Process-wide limits, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    /// Characters returned by a single file read before truncation
    #[serde(rename = "max-file-read-chars")]
    pub max_file_read_chars: usize,

    /// Model queries allowed before the conversation is aborted
    #[serde(rename = "max-conversation-rounds")]
    pub max_conversation_rounds: u32,

    /// Wall-clock budget for a script run
    #[serde(rename = "subprocess-timeout-secs")]
    pub subprocess_timeout_secs: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_file_read_chars: 10_000,
            max_conversation_rounds: 20,
            subprocess_timeout_secs: 30,
        }
    }
}

/// Sandbox root and script runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory all function calls are confined to
    #[serde(rename = "working-dir")]
    pub working_dir: PathBuf,

    /// Interpreter used to run scripts
    pub interpreter: String,

    /// File extensions accepted as scripts (without the dot)
    pub extensions: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("./calculator"),
            interpreter: "python3".to_string(),
            extensions: vec!["py".to_string()],
        }
    }
}
