//! Run parameters (`params.yaml`) and completion endpoint settings.

use crate::types::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level parameter file, DVC style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub generate: GenerateParams,
}

/// `generate` stage parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateParams {
    pub prompt: PromptParams,
    pub llm: LlmParams,
}

/// Prompt template and schema context locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub prompt_path: PathBuf,
    pub schema_path: PathBuf,
}

/// Model and sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmParams {
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Total attempts per completion
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    300
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    60
}

impl Params {
    /// Load and validate a parameter file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EvalError::config(format!("Cannot read params file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate parameters from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut params: Params = serde_yaml::from_str(content)?;
        params.generate.prompt.prompt_path = expand_path(&params.generate.prompt.prompt_path)?;
        params.generate.prompt.schema_path = expand_path(&params.generate.prompt.schema_path)?;
        params.generate.llm.validate()?;
        Ok(params)
    }
}

impl LlmParams {
    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(EvalError::config("generate.llm.model must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(EvalError::config("generate.llm.max_tokens must be positive"));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(EvalError::config(format!(
                "generate.llm.temperature must be >= 0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Expand `~` and environment variables in a path.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| EvalError::config(format!("Cannot expand path {}: {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Fully resolved settings for the completion client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,

    /// Base URL of an OpenAI-compatible API, e.g. `http://localhost:8000/v1`
    pub base_url: String,
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Combine model parameters with endpoint location and credentials.
    pub fn new(llm: &LlmParams, base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(EvalError::config(
                "Completion endpoint URL required (set OPENAI_URL or --openai-url)",
            ));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(EvalError::config(format!(
                "Completion endpoint URL must be http(s): {}",
                base_url
            )));
        }

        Ok(Self {
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            retries: llm.retries.max(1),
            retry_delay: Duration::from_secs(llm.retry_delay_secs),
            timeout: Duration::from_secs(llm.timeout_secs),
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Legacy text-completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/completions", self.base_url)
    }
}
