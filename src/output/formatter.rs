//! Output formatters for console, JSON and markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::llm::analyzer::AnalysisResult;
use crate::output::report::AnalysisReport;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".blue().bold(), title.blue().bold())
        } else {
            format!("\n{} {}\n", "█", title)
        }
    }

    fn format_status(&self, result: &AnalysisResult) -> String {
        let (badge, color) = match result {
            AnalysisResult::Ok(_) => ("COMPLETE", Color::Green),
            AnalysisResult::Empty => ("NO INPUT", Color::Yellow),
            AnalysisResult::Failed(_) => ("FAILED", Color::Red),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("CONTRACT ANALYSIS"));
        output.push_str(&format!(
            "{} {} | {} | {} | {}ms\n",
            self.format_status(&report.result),
            report.source,
            report.language,
            self.colorize(&report.model, Color::Cyan),
            report.processing_time_ms
        ));
        output.push_str(&self.colorize(&"─".repeat(60), Color::BrightBlack));
        output.push('\n');

        let body = match &report.result {
            AnalysisResult::Failed(message) => self.colorize(message, Color::Red),
            other => other.text().to_string(),
        };
        output.push_str(&body);
        output.push('\n');

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::from("# Contract Analysis\n\n");

        if self.include_metadata {
            output.push_str(&format!("- **Source:** {}\n", report.source));
            output.push_str(&format!("- **Language:** {}\n", report.language));
            output.push_str(&format!("- **Model:** {}\n", report.model));
            output.push_str(&format!(
                "- **Generated:** {}\n\n",
                report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }

        if let AnalysisResult::Failed(message) = &report.result {
            output.push_str(&format!("> **Error:** {}\n", message));
        } else {
            output.push_str(report.result.text());
            output.push('\n');
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, true, true)
    }

    pub fn with_options(use_colors: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, source_name: &str) -> String {
    let base_name = Path::new(source_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");

    match format {
        OutputFormat::Console => format!("{}_analysis_{}.txt", base_name, timestamp),
        OutputFormat::Json => format!("{}_analysis_{}.json", base_name, timestamp),
        OutputFormat::Markdown => format!("{}_analysis_{}.md", base_name, timestamp),
    }
}
