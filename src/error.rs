//! Error handling for the contract analyzer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractAnalyzerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error extracting text from PDF: {0}")]
    PdfExtraction(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the external completion call.
///
/// These never escape the analyzer; they are rendered into
/// [`crate::llm::analyzer::AnalysisResult::Failed`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::MalformedResponse(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ContractAnalyzerError>;

/// Convert tokenizer errors to our custom error type
impl From<tokenizers::Error> for ContractAnalyzerError {
    fn from(err: tokenizers::Error) -> Self {
        ContractAnalyzerError::Tokenizer(err.to_string())
    }
}
