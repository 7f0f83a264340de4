//! Input size budgets measured in characters or model tokens

use crate::config::{ProcessingConfig, SizeUnit};
use crate::error::{ContractAnalyzerError, Result};
use log::info;
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Encoder/decoder used for token budgets.
pub trait Tokenize: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, ids: &[u32]) -> Result<String>;
}

impl Tokenize for Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self.deref().encode(text, false)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        Ok(self.deref().decode(ids, true)?)
    }
}

/// Upper bound on the payload sent to the model.
#[derive(Clone)]
pub enum SizeBudget {
    Characters(usize),
    Tokens {
        max_tokens: usize,
        tokenizer: Arc<dyn Tokenize>,
    },
}

impl SizeBudget {
    pub fn characters(max_chars: usize) -> Self {
        SizeBudget::Characters(max_chars)
    }

    pub fn tokens(max_tokens: usize, tokenizer: Arc<dyn Tokenize>) -> Self {
        SizeBudget::Tokens {
            max_tokens,
            tokenizer,
        }
    }

    /// Build from configuration, loading the tokenizer file for token budgets.
    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        match config.size_unit {
            SizeUnit::Characters => Ok(Self::characters(config.max_input_size)),
            SizeUnit::Tokens => {
                let path = config.tokenizer_path.as_deref().ok_or_else(|| {
                    ContractAnalyzerError::Configuration(
                        "size_unit = \"tokens\" requires processing.tokenizer_path".to_string(),
                    )
                })?;
                let tokenizer = load_tokenizer(path)?;
                Ok(Self::tokens(config.max_input_size, Arc::new(tokenizer)))
            }
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            SizeBudget::Characters(max) => *max,
            SizeBudget::Tokens { max_tokens, .. } => *max_tokens,
        }
    }

    pub fn unit(&self) -> SizeUnit {
        match self {
            SizeBudget::Characters(_) => SizeUnit::Characters,
            SizeBudget::Tokens { .. } => SizeUnit::Tokens,
        }
    }

    /// Size of `text` in this budget's unit.
    pub fn measure(&self, text: &str) -> Result<usize> {
        match self {
            SizeBudget::Characters(_) => Ok(text.chars().count()),
            SizeBudget::Tokens { tokenizer, .. } => Ok(tokenizer.encode(text)?.len()),
        }
    }
}

impl fmt::Debug for SizeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBudget::Characters(max) => f.debug_tuple("Characters").field(max).finish(),
            SizeBudget::Tokens { max_tokens, .. } => f
                .debug_struct("Tokens")
                .field("max_tokens", max_tokens)
                .finish_non_exhaustive(),
        }
    }
}

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    if !path.exists() {
        return Err(ContractAnalyzerError::Configuration(format!(
            "Tokenizer file not found: {}",
            path.display()
        )));
    }
    info!("Loading tokenizer from {}", path.display());
    Ok(Tokenizer::from_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_budget_counts_chars_not_bytes() {
        let budget = SizeBudget::characters(10);
        assert_eq!(budget.measure("cláusula").unwrap(), 8);
        assert_eq!(budget.limit(), 10);
        assert_eq!(budget.unit(), SizeUnit::Characters);
    }

    #[test]
    fn test_token_budget_requires_tokenizer_path() {
        let config = ProcessingConfig {
            max_input_size: 100,
            size_unit: SizeUnit::Tokens,
            tokenizer_path: None,
            strip_markdown: true,
        };
        assert!(matches!(
            SizeBudget::from_config(&config),
            Err(ContractAnalyzerError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let result = load_tokenizer(Path::new("no/such/tokenizer.json"));
        assert!(result.is_err());
    }
}
