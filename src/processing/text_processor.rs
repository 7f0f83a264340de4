//! Text normalization, artifact removal and budget enforcement

use crate::config::SizeUnit;
use crate::error::Result;
use crate::processing::budget::SizeBudget;
use log::debug;
use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// A period within the trailing fifth of the budget is a valid cut point.
const SENTENCE_CUT_NUMERATOR: usize = 4;
const SENTENCE_CUT_DENOMINATOR: usize = 5;

pub struct TextProcessor {
    whitespace_regex: Regex,
    page_footer_regex: Regex,
    empty_bracket_regex: Regex,
    continued_regex: Regex,
    disallowed_regex: Regex,
}

/// Bounded text plus the stats gathered while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedText {
    pub text: String,
    pub original_chars: usize,
    pub character_count: usize,
    pub word_count: usize,
    /// Final size in `unit`.
    pub size: usize,
    pub unit: SizeUnit,
    pub truncated: bool,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        let page_footer_regex =
            Regex::new(r"(?i)\bpage\s+\d+\s+of\s+\d+\b").expect("Invalid page footer regex");

        let empty_bracket_regex =
            Regex::new(r"\[\s*\]|\(\s*\)|\{\s*\}").expect("Invalid empty bracket regex");

        let continued_regex =
            Regex::new(r"(?i)\(\s*continued\s*\)").expect("Invalid continued marker regex");

        let disallowed_regex =
            Regex::new(r#"[^\w\s.,;:\-'"(){}\[\]]"#).expect("Invalid allow-list regex");

        Self {
            whitespace_regex,
            page_footer_regex,
            empty_bracket_regex,
            continued_regex,
            disallowed_regex,
        }
    }

    /// Normalize `text` and bound it to `budget`.
    pub fn preprocess(&self, text: &str, budget: &SizeBudget) -> Result<String> {
        Ok(self.process(text, budget)?.text)
    }

    /// Like [`preprocess`](Self::preprocess), also reporting stats.
    pub fn process(&self, text: &str, budget: &SizeBudget) -> Result<ProcessedText> {
        let original_chars = text.chars().count();
        let normalized = self.normalize(text);

        let (bounded, truncated) = match budget {
            SizeBudget::Characters(max_chars) => {
                if normalized.chars().count() > *max_chars {
                    (truncate_chars(&normalized, *max_chars), true)
                } else {
                    (normalized, false)
                }
            }
            SizeBudget::Tokens {
                max_tokens,
                tokenizer,
            } => {
                let ids = tokenizer.encode(&normalized)?;
                if ids.len() > *max_tokens {
                    debug!("Truncating {} tokens to {}", ids.len(), max_tokens);
                    (tokenizer.decode(&ids[..*max_tokens])?, true)
                } else {
                    (normalized, false)
                }
            }
        };

        let text = if truncated {
            bounded.trim().to_string()
        } else {
            bounded
        };

        if truncated {
            debug!(
                "Bounded text from {} to {} characters",
                original_chars,
                text.chars().count()
            );
        }

        Ok(ProcessedText {
            original_chars,
            character_count: text.chars().count(),
            word_count: text.unicode_words().count(),
            size: budget.measure(&text)?,
            unit: budget.unit(),
            truncated,
            text,
        })
    }

    /// Steps 1-4 of the pipeline plus the final trim, repeated until stable.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.normalize_pass(text);
        loop {
            let next = self.normalize_pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn normalize_pass(&self, text: &str) -> String {
        let collapsed = self.collapse_whitespace(text);
        let without_artifacts = self.remove_artifacts(&collapsed);
        let recollapsed = self.collapse_whitespace(&without_artifacts);
        let allowed = self.strip_disallowed(&recollapsed);
        self.collapse_whitespace(&allowed).trim().to_string()
    }

    /// Collapse every whitespace run, newlines included, to one space.
    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_regex.replace_all(text, " ").into_owned()
    }

    /// Remove page footers, empty bracket placeholders and continuation markers.
    pub fn remove_artifacts(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        loop {
            let mut next = self.page_footer_regex.replace_all(&cleaned, "").into_owned();
            next = self.continued_regex.replace_all(&next, "").into_owned();
            next = self.empty_bracket_regex.replace_all(&next, "").into_owned();
            // Nested placeholders like "( () )" need another round.
            if next == cleaned {
                return cleaned;
            }
            cleaned = next;
        }
    }

    /// Replace characters outside the allow-list with a space.
    pub fn strip_disallowed(&self, text: &str) -> String {
        self.disallowed_regex.replace_all(text, " ").into_owned()
    }
}

/// Cut `text` to at most `max_chars` characters, preferring a sentence end.
///
/// Inside the `max_chars` prefix the last period followed by whitespace (or
/// by the end of `text`) wins if it sits at or beyond 80% of `max_chars`.
/// Otherwise the prefix is returned as a hard cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let boundary = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let prefix = &text[..boundary];

    let threshold = max_chars * SENTENCE_CUT_NUMERATOR;
    let sentence_end = prefix
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| *c == '.')
        .filter(|(_, (byte_idx, _))| {
            text[byte_idx + 1..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace)
        })
        .map(|(char_pos, (byte_idx, _))| (char_pos, byte_idx))
        .last();

    match sentence_end {
        Some((char_pos, byte_idx)) if char_pos * SENTENCE_CUT_DENOMINATOR >= threshold => {
            text[..=byte_idx].to_string()
        }
        _ => prefix.to_string(),
    }
}

/// Character-budget shorthand for [`TextProcessor::preprocess`].
pub fn preprocess(text: &str, max_chars: usize) -> String {
    let processor = TextProcessor::new();
    let normalized = processor.normalize(text);
    if normalized.chars().count() > max_chars {
        truncate_chars(&normalized, max_chars).trim().to_string()
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContractAnalyzerError;
    use crate::processing::budget::Tokenize;
    use std::sync::Arc;

    /// One token per whitespace-separated word.
    struct WordTokenizer;

    impl Tokenize for WordTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text.split_whitespace().map(|w| w.len() as u32).collect())
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            Ok(ids
                .iter()
                .map(|len| "w".repeat(*len as usize))
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    struct BrokenTokenizer;

    impl Tokenize for BrokenTokenizer {
        fn encode(&self, _text: &str) -> Result<Vec<u32>> {
            Err(ContractAnalyzerError::Tokenizer("vocab missing".to_string()))
        }

        fn decode(&self, _ids: &[u32]) -> Result<String> {
            unreachable!()
        }
    }

    #[test]
    fn test_artifacts_and_whitespace_removed() {
        let output = preprocess("Page 1 of 3   Some   clause text.   (continued)", 1000);
        assert_eq!(output, "Some clause text.");
    }

    #[test]
    fn test_newlines_collapse_to_spaces() {
        let output = preprocess("First line\n\nsecond\tline\r\n", 1000);
        assert_eq!(output, "First line second line");
    }

    #[test]
    fn test_artifact_patterns() {
        let processor = TextProcessor::new();
        assert_eq!(processor.remove_artifacts("a PAGE 12 of 40 b"), "a  b");
        assert_eq!(processor.remove_artifacts("Clause [ ] and () and {}"), "Clause  and  and ");
        assert_eq!(processor.remove_artifacts("x (Continued) y"), "x  y");
        assert_eq!(processor.remove_artifacts("( () )"), "");
    }

    #[test]
    fn test_artifact_free_text_unchanged() {
        let processor = TextProcessor::new();
        let samples = [
            "The Lessee shall pay rent on the first day of each month.",
            "Section 4(a) applies to [the Tenant] and {the Landlord}.",
            "Pages 3 to 5 of the annex are incorporated by reference.",
            "The page count is 12; see Schedule B.",
        ];
        for sample in samples {
            assert_eq!(processor.remove_artifacts(sample), sample);
        }
    }

    #[test]
    fn test_disallowed_characters_become_spaces() {
        let processor = TextProcessor::new();
        assert_eq!(processor.strip_disallowed("fee$100"), "fee 100");
        assert_eq!(preprocess("Fee: $100 & costs!", 1000), "Fee: 100 costs");
        // Unicode word characters survive.
        assert_eq!(preprocess("Cláusula décima", 1000), "Cláusula décima");
    }

    #[test]
    fn test_allowed_punctuation_kept() {
        let text = r#"A, b; c: d-e 'f' "g" (h) {i} [j]."#;
        assert_eq!(preprocess(text, 1000), text);
    }

    #[test]
    fn test_sentence_cut_at_85_percent() {
        // Period at index 85 of a 100-character budget.
        let text = format!("{}. {}", "a".repeat(85), "b".repeat(200));
        let output = truncate_chars(&text, 100);
        assert_eq!(output.chars().count(), 86);
        assert!(output.ends_with('.'));
    }

    #[test]
    fn test_hard_cut_without_late_period() {
        // Only period sits at 70% of the budget.
        let text = format!("{}. {}", "a".repeat(70), "b".repeat(200));
        let output = truncate_chars(&text, 100);
        assert_eq!(output.chars().count(), 100);
        assert!(output.ends_with('b'));
    }

    #[test]
    fn test_hard_cut_length_is_exact() {
        let text = "x".repeat(500);
        let output = preprocess(&text, 120);
        assert_eq!(output.chars().count(), 120);
    }

    #[test]
    fn test_hard_cut_keeps_partial_footer_text() {
        // The cut leaves "Page 1 of 1", which must not be removed as a footer.
        let output = preprocess("abcdefghi Page 1 of 12x more words", 21);
        assert_eq!(output, "abcdefghi Page 1 of 1");
        assert_eq!(output.chars().count(), 21);
    }

    #[test]
    fn test_decimal_point_is_not_a_sentence_end() {
        let text = format!("{}3.5{}", "a".repeat(88), "b".repeat(50));
        let output = truncate_chars(&text, 100);
        assert_eq!(output.chars().count(), 100);
    }

    #[test]
    fn test_truncation_handles_multibyte_chars() {
        let text = "é".repeat(50);
        let output = truncate_chars(&text, 10);
        assert_eq!(output, "é".repeat(10));
    }

    #[test]
    fn test_output_never_exceeds_budget() {
        let inputs = vec![
            "Short.".to_string(),
            "Page 1 of 2 The parties agree. Page 2 of 2 Termination requires notice.".to_string(),
            "word ".repeat(300),
            "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.".to_string(),
        ];
        for input in &inputs {
            for max in [0, 1, 5, 17, 40, 100] {
                assert!(preprocess(input, max).chars().count() <= max);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Page 1 of 3   Some   clause text.   (continued)",
            "Fee: $100 & costs! [ ] Payable (§ 4).",
            "Line one\nLine two\n\n\nPage 2 of 2",
            "( () ) Pa()ge 1 of 2 x",
        ];
        for input in inputs {
            let once = preprocess(input, 10_000);
            assert_eq!(preprocess(&once, 10_000), once);
        }

        let long = "The buyer pays. ".repeat(40);
        let once = preprocess(&long, 90);
        assert_eq!(preprocess(&once, 90), once);
    }

    #[test]
    fn test_process_reports_stats() {
        let processor = TextProcessor::new();
        let budget = SizeBudget::characters(20);
        let report = processor
            .process("Page 1 of 9 The tenant shall maintain the premises.", &budget)
            .unwrap();

        assert!(report.truncated);
        assert!(report.character_count <= 20);
        assert_eq!(report.size, report.character_count);
        assert_eq!(report.unit, SizeUnit::Characters);
        assert!(report.word_count > 0);
        assert_eq!(report.original_chars, 51);
    }

    #[test]
    fn test_token_budget_truncates_token_sequence() {
        let processor = TextProcessor::new();
        let budget = SizeBudget::tokens(3, Arc::new(WordTokenizer));
        let report = processor.process("one two three four five", &budget).unwrap();

        assert!(report.truncated);
        assert_eq!(report.text, "www www wwwww");
        assert_eq!(report.size, 3);
        assert_eq!(report.unit, SizeUnit::Tokens);
    }

    #[test]
    fn test_token_budget_under_limit_is_untouched() {
        let processor = TextProcessor::new();
        let budget = SizeBudget::tokens(10, Arc::new(WordTokenizer));
        let text = processor.preprocess("one   two", &budget).unwrap();
        assert_eq!(text, "one two");
    }

    #[test]
    fn test_tokenizer_failure_propagates() {
        let processor = TextProcessor::new();
        let budget = SizeBudget::tokens(10, Arc::new(BrokenTokenizer));
        assert!(processor.preprocess("text", &budget).is_err());
    }
}
