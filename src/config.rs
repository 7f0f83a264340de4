//! Configuration management for the contract analyzer

use crate::error::{ContractAnalyzerError, Result};
use crate::llm::prompts::{Language, PromptTemplate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const SYSTEM_PROMPT_VAR: &str = "SYSTEM_PROMPT";
pub const MODEL_VAR: &str = "CONTRACT_ANALYZER_MODEL";
pub const MAX_TOKENS_VAR: &str = "CONTRACT_ANALYZER_MAX_TOKENS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub processing: ProcessingConfig,
    pub prompt: PromptConfig,
    pub output: OutputConfig,
    /// Read from the environment only, never written to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub max_output_tokens: u32,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Input budget, measured in `size_unit`.
    pub max_input_size: usize,
    pub size_unit: SizeUnit,
    /// `tokenizer.json` used when `size_unit = "tokens"`.
    pub tokenizer_path: Option<PathBuf>,
    pub strip_markdown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Characters,
    Tokens,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub template: PromptTemplate,
    /// Replaces the template text entirely when set.
    pub system_prompt: Option<String>,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                model_id: "claude-3-opus-20240229".to_string(),
                max_output_tokens: 4096,
                api_base: "https://api.anthropic.com/v1".to_string(),
                timeout_secs: 120,
            },
            processing: ProcessingConfig {
                max_input_size: 48_000,
                size_unit: SizeUnit::Characters,
                tokenizer_path: None,
                strip_markdown: true,
            },
            prompt: PromptConfig {
                template: PromptTemplate::ContractReview,
                system_prompt: None,
                language: Language::English,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
            api_key: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file is created with default values. A missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ContractAnalyzerError::Configuration(format!(
                        "Config file does not exist: {}",
                        path.display()
                    )));
                }
                Self::load_from(path)
            }
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    Self::load_from(&config_path)
                } else {
                    let config = Self::default();
                    config.save_to(&config_path)?;
                    info!("Wrote default configuration to {}", config_path.display());
                    Ok(config)
                }
            }
        }
    }

    /// Overwrite `path` (or the default location) with default values.
    ///
    /// The existing file is never parsed, so a broken file can be repaired.
    pub fn reset(path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        Self::default().save_to(&path)?;
        info!("Reset configuration at {}", path.display());
        Ok(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            ContractAnalyzerError::Configuration(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ContractAnalyzerError::Configuration(format!("Failed to serialize config: {}", e))
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("contract-analyzer")
            .join("config.toml")
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(prompt) = get(SYSTEM_PROMPT_VAR) {
            debug!("Using system prompt from {}", SYSTEM_PROMPT_VAR);
            self.prompt.system_prompt = Some(prompt);
        }
        if let Some(model) = get(MODEL_VAR) {
            self.model.model_id = model;
        }
        if let Some(max_tokens) = get(MAX_TOKENS_VAR) {
            self.model.max_output_tokens = max_tokens.trim().parse().map_err(|_| {
                ContractAnalyzerError::Configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    MAX_TOKENS_VAR, max_tokens
                ))
            })?;
        }

        Ok(self)
    }

    /// The API credential; its absence is fatal for any analysis run.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ContractAnalyzerError::Configuration(format!(
                "API key not found. Please set {} in the environment or a .env file",
                API_KEY_VAR
            ))
        })
    }

    /// Effective system prompt: the override if present, else the template text.
    pub fn system_prompt(&self) -> String {
        self.prompt
            .system_prompt
            .clone()
            .unwrap_or_else(|| self.prompt.template.text().to_string())
    }
}
