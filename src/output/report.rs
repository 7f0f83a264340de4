//! Report structure wrapping one analysis result

use crate::llm::analyzer::AnalysisResult;
use crate::llm::prompts::Language;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// File name, or "direct input" for text given on the command line.
    pub source: String,
    pub language: Language,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub result: AnalysisResult,
}

impl AnalysisReport {
    pub fn new(
        source: impl Into<String>,
        language: Language,
        model: impl Into<String>,
        result: AnalysisResult,
    ) -> Self {
        Self {
            source: source.into(),
            language,
            model: model.into(),
            generated_at: Utc::now(),
            processing_time_ms: 0,
            result,
        }
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = ms;
        self
    }
}
