//! Text extraction from various file formats

use crate::error::{ContractAnalyzerError, Result};
use crate::input::file_detector::FileType;
use log::{debug, info, warn};
use lopdf::Document;
use pulldown_cmark::{html, Parser};
use regex::Regex;
use std::path::Path;
use tokio::fs;

/// Extract the text of the file at `path` with the extractor for its type.
pub async fn extract_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ContractAnalyzerError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    match FileType::from_path(path) {
        Some(FileType::Pdf) => {
            info!("Extracting text from PDF: {}", path.display());
            PdfExtractor.extract(path).await
        }
        Some(FileType::Text) => {
            info!("Reading plain text file: {}", path.display());
            PlainTextExtractor.extract(path).await
        }
        Some(FileType::Markdown) => {
            info!("Rendering markdown file: {}", path.display());
            MarkdownExtractor.extract(path).await
        }
        Some(FileType::Unknown) => Err(ContractAnalyzerError::UnsupportedFormat(format!(
            "Unsupported file type for: {}",
            path.display()
        ))),
        None => Err(ContractAnalyzerError::InvalidInput(format!(
            "File has no extension: {}",
            path.display()
        ))),
    }
}

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;

        self.extract_bytes(Some(bytes.as_slice())).map_err(|e| match e {
            ContractAnalyzerError::PdfExtraction(msg) => {
                ContractAnalyzerError::PdfExtraction(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }
}

impl PdfExtractor {
    /// Extract the text of every page, in page order, each followed by a newline.
    ///
    /// `None` or an empty buffer yields an empty string. A page whose text
    /// cannot be decoded contributes an empty segment.
    pub fn extract_bytes(&self, document: Option<&[u8]>) -> Result<String> {
        let bytes = match document {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(String::new()),
        };

        match Document::load_mem(bytes) {
            Ok(doc) => {
                let pages = doc.get_pages();
                debug!("PDF has {} pages", pages.len());

                let texts: Vec<String> = pages
                    .keys()
                    .map(|&page_num| {
                        doc.extract_text(&[page_num]).unwrap_or_else(|e| {
                            warn!("Page {} yielded no text: {}", page_num, e);
                            String::new()
                        })
                    })
                    .collect();
                Ok(join_pages(&texts))
            }
            Err(load_err) => {
                // pdf-extract tolerates some documents lopdf rejects outright.
                debug!("lopdf could not load document ({}), trying pdf-extract", load_err);
                let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                    ContractAnalyzerError::PdfExtraction(format!("{}; {}", load_err, e))
                })?;
                Ok(text)
            }
        }
    }
}

/// Concatenate page texts in order, one trailing newline per page.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages.iter().fold(String::new(), |mut text, page| {
        text.push_str(page.as_ref());
        text.push('\n');
        text
    })
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(self.markdown_to_text(&markdown_content))
    }
}

impl MarkdownExtractor {
    pub fn markdown_to_text(&self, markdown: &str) -> String {
        let parser = Parser::new(markdown);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        self.html_to_text(&html_output)
    }

    fn html_to_text(&self, html: &str) -> String {
        let text = html
            .replace("<br />", "\n")
            .replace("</p>", "\n\n")
            .replace("</li>", "\n");

        let tag_regex = Regex::new(r"<[^>]*>").expect("Invalid tag regex");
        let stripped = tag_regex.replace_all(&text, "");

        // Entities last, so decoded brackets are not taken for tags.
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");

        decoded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
