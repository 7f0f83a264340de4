//! Contract analysis: instruction assembly, completion call and cleanup

use crate::config::Config;
use crate::error::Result;
use crate::llm::client::{AnalysisRequest, CompletionProvider};
use crate::llm::postprocess::MarkdownStripper;
use crate::llm::prompts::{build_instruction, Language};
use crate::processing::budget::SizeBudget;
use crate::processing::text_processor::TextProcessor;
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

pub const NO_TEXT_SENTINEL: &str = "No text provided for analysis.";
pub const FAILURE_PREFIX: &str = "Error in contract analysis";

/// Outcome of one analysis call. Every variant has display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum AnalysisResult {
    /// Nothing to analyze; the service was not called.
    Empty,
    Ok(String),
    /// The service call failed; carries a user-facing message.
    Failed(String),
}

impl AnalysisResult {
    pub fn text(&self) -> &str {
        match self {
            AnalysisResult::Empty => NO_TEXT_SENTINEL,
            AnalysisResult::Ok(text) | AnalysisResult::Failed(text) => text,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AnalysisResult::Ok(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisResult::Failed(_))
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Per-run analyzer parameters, fixed at construction.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub system_prompt: String,
    pub model_id: String,
    pub max_output_tokens: u32,
    pub strip_markdown: bool,
}

impl AnalyzerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            system_prompt: config.system_prompt(),
            model_id: config.model.model_id.clone(),
            max_output_tokens: config.model.max_output_tokens,
            strip_markdown: config.processing.strip_markdown,
        }
    }
}

pub struct ContractAnalyzer<P> {
    provider: P,
    settings: AnalyzerSettings,
    budget: SizeBudget,
    processor: TextProcessor,
    stripper: MarkdownStripper,
}

impl<P: CompletionProvider> ContractAnalyzer<P> {
    pub fn new(provider: P, settings: AnalyzerSettings, budget: SizeBudget) -> Self {
        Self {
            provider,
            settings,
            budget,
            processor: TextProcessor::new(),
            stripper: MarkdownStripper::new(),
        }
    }

    /// Build settings and input budget from `config`.
    pub fn from_config(config: &Config, provider: P) -> Result<Self> {
        let budget = SizeBudget::from_config(&config.processing)?;
        Ok(Self::new(provider, AnalyzerSettings::from_config(config), budget))
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Analyze with a free-form language selector ("spanish" or anything else).
    pub async fn analyze(&self, text: &str, language: &str) -> AnalysisResult {
        self.analyze_in(text, Language::from_selector(language)).await
    }

    /// Analyze `text`, never failing: errors become [`AnalysisResult::Failed`].
    pub async fn analyze_in(&self, text: &str, language: Language) -> AnalysisResult {
        if text.trim().is_empty() {
            info!("No text provided, skipping completion call");
            return AnalysisResult::Empty;
        }

        let request = match self.build_request(text, language) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to prepare analysis request: {}", e);
                return failure(e);
            }
        };

        if request.payload.is_empty() {
            info!("Text was empty after preprocessing, skipping completion call");
            return AnalysisResult::Empty;
        }

        info!(
            "Requesting {} analysis from {} ({} characters, max {} output tokens)",
            language,
            request.model,
            request.payload.chars().count(),
            request.max_output_tokens
        );

        let start_time = Instant::now();
        match self.provider.complete(&request).await {
            Ok(response) => {
                info!("Analysis received in {} ms", start_time.elapsed().as_millis());
                let text = if self.settings.strip_markdown {
                    self.stripper.strip(&response)
                } else {
                    response
                };
                AnalysisResult::Ok(text)
            }
            Err(e) => {
                warn!("Completion service failed: {}", e);
                failure(e)
            }
        }
    }

    /// Assemble the instruction and bounded payload for `text`.
    pub fn build_request(&self, text: &str, language: Language) -> Result<AnalysisRequest> {
        let payload = self.processor.preprocess(text, &self.budget)?;

        Ok(AnalysisRequest {
            instruction: build_instruction(&self.settings.system_prompt, language),
            payload,
            model: self.settings.model_id.clone(),
            max_output_tokens: self.settings.max_output_tokens,
        })
    }
}

fn failure(error: impl fmt::Display) -> AnalysisResult {
    AnalysisResult::Failed(format!("{}: {}", FAILURE_PREFIX, error))
}
