//! Contract analyzer library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod llm;
pub mod output;

pub use error::{ContractAnalyzerError, Result, ServiceError};
pub use config::Config;
pub use llm::analyzer::{AnalysisResult, ContractAnalyzer};
