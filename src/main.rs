//! Contract analyzer: AI-powered contract risk analysis

use anyhow::{bail, Context};
use clap::Parser;
use contract_analyzer::cli::{self, Cli, Commands, ConfigAction};
use contract_analyzer::config::{Config, API_KEY_VAR};
use contract_analyzer::input::extract_file;
use contract_analyzer::llm::client::AnthropicClient;
use contract_analyzer::llm::prompts::{Language, PromptTemplate};
use contract_analyzer::output::formatter::{save_report_to_file, suggest_filename, ReportGenerator};
use contract_analyzer::output::report::AnalysisReport;
use contract_analyzer::processing::{SizeBudget, TextProcessor};
use contract_analyzer::ContractAnalyzer;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "text", "md", "markdown"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => {
            error!("Failed to read .env file: {}", e);
            process::exit(1);
        }
    }

    if let Err(e) = run_command(cli.command, cli.config).await {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

/// Load the configuration file and apply environment overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::load(path)
        .and_then(Config::with_env)
        .context("Failed to load configuration")?;
    Ok(config)
}

async fn run_command(command: Commands, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Analyze {
            file,
            text,
            language,
            prompt,
            model,
            max_tokens,
            output,
            save,
            raw,
        } => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(language) = &language {
                config.prompt.language = Language::from_selector(language);
            }
            if let Some(prompt) = &prompt {
                match PromptTemplate::parse(prompt) {
                    Some(template) => config.prompt.template = template,
                    None => bail!(
                        "Unknown prompt template '{}'. Supported: contract-review, favorability-review",
                        prompt
                    ),
                }
            }
            if let Some(model) = model {
                config.model.model_id = model;
            }
            if let Some(max_tokens) = max_tokens {
                config.model.max_output_tokens = max_tokens;
            }
            if raw {
                config.processing.strip_markdown = false;
            }
            let output_format = match &output {
                Some(format) => cli::parse_output_format(format).map_err(anyhow::Error::msg)?,
                None => config.output.format,
            };

            let api_key = config.require_api_key()?.to_string();

            let (source, contract_text) = match (file, text) {
                (Some(path), _) => {
                    let text = extract(&path).await?;
                    (display_name(&path), text)
                }
                (None, Some(text)) => ("direct input".to_string(), text),
                (None, None) => bail!("Either --file or --text is required"),
            };
            info!("Contract text length: {} characters", contract_text.chars().count());

            let client = AnthropicClient::new(api_key, &config.model)?;
            let analyzer = ContractAnalyzer::from_config(&config, client)
                .context("Failed to set up analyzer")?;

            let start_time = Instant::now();
            let result = analyzer.analyze_in(&contract_text, config.prompt.language).await;
            let report = AnalysisReport::new(
                source,
                config.prompt.language,
                &config.model.model_id,
                result,
            )
            .with_processing_time(start_time.elapsed().as_millis() as u64);

            let use_colors = config.output.color_output && save.is_none();
            let generator = ReportGenerator::with_options(use_colors, true, true);
            let rendered = generator.generate_report(&report, &output_format)?;

            match save {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(suggest_filename(&output_format, &report.source))
                    } else {
                        path
                    };
                    save_report_to_file(&rendered, &path)
                        .with_context(|| format!("Failed to save report to {}", path.display()))?;
                    info!("Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Extract { file } => {
            let text = extract(&file).await?;
            print!("{}", text);
        }

        Commands::Preprocess {
            file,
            max_size,
            stats,
        } => {
            let mut config = load_config(config_path.as_deref())?;
            if let Some(max_size) = max_size {
                config.processing.max_input_size = max_size;
            }
            let text = extract(&file).await?;
            let budget = SizeBudget::from_config(&config.processing)?;
            let processed = TextProcessor::new()
                .process(&text, &budget)
                .context("Failed to preprocess text")?;

            println!("{}", processed.text);
            if stats {
                eprintln!(
                    "original: {} chars | bounded: {} chars, {} words, {} {:?} (limit {}) | truncated: {}",
                    processed.original_chars,
                    processed.character_count,
                    processed.word_count,
                    processed.size,
                    processed.unit,
                    budget.limit(),
                    processed.truncated
                );
            }
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let config = load_config(config_path.as_deref())?;
                println!("{}", config.to_toml()?);
                let key_state = if config.api_key.is_some() { "set" } else { "missing" };
                println!("# {}: {}", API_KEY_VAR, key_state);
            }
            ConfigAction::Path => {
                let path = config_path.unwrap_or_else(Config::config_path);
                println!("{}", path.display());
            }
            ConfigAction::Reset => {
                let path = Config::reset(config_path.as_deref())?;
                println!("Configuration reset: {}", path.display());
            }
        },
    }

    Ok(())
}

async fn extract(path: &Path) -> anyhow::Result<String> {
    cli::validate_file_extension(&path.to_path_buf(), SUPPORTED_EXTENSIONS)
        .map_err(|e| anyhow::anyhow!("Contract file: {}", e))?;

    let text = extract_file(path)
        .await
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;
    Ok(text)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
