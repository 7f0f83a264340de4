//! CLI interface for the contract analyzer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contract-analyzer")]
#[command(about = "AI-powered contract risk analysis")]
#[command(long_about = "Extract text from contract documents, clean and bound it, and request a structured legal-risk analysis from a language model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a contract document or text
    Analyze {
        /// Path to contract file (PDF, TXT, MD)
        #[arg(short, long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,

        /// Contract text given directly
        #[arg(short, long)]
        text: Option<String>,

        /// Response language: english or spanish
        #[arg(short, long)]
        language: Option<String>,

        /// Prompt template: contract-review or favorability-review
        #[arg(short, long)]
        prompt: Option<String>,

        /// Model identifier to use
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of output tokens
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Keep markdown in the model response
        #[arg(long)]
        raw: bool,
    },

    /// Print the raw text extracted from a document
    Extract {
        /// Path to contract file (PDF, TXT, MD)
        file: PathBuf,
    },

    /// Print the cleaned, size-bounded text that would be sent for analysis
    Preprocess {
        /// Path to contract file (PDF, TXT, MD)
        file: PathBuf,

        /// Override the configured input budget
        #[arg(long)]
        max_size: Option<usize>,

        /// Print processing stats
        #[arg(long)]
        stats: bool,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &PathBuf, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
