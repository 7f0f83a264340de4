//! Cosmetic cleanup of model output

use regex::{Captures, Regex};

/// Removes lightweight markdown presentation tokens from model responses.
///
/// Emphasis markers, heading markers, horizontal rules and leading list
/// bullets are dropped. Numbered lists and the words themselves are kept.
///
/// An emphasis delimiter only counts when it hugs its text: `*a*` is
/// emphasis, `2 * base * 3` is arithmetic. Underscore pairs around a single
/// identifier (`__init__`, `_id_`) are left alone.
pub struct MarkdownStripper {
    rule_regex: Regex,
    heading_regex: Regex,
    bullet_regex: Regex,
    strong_regex: Regex,
    emphasis_regex: Regex,
    underscore_strong_regex: Regex,
    underscore_regex: Regex,
}

impl Default for MarkdownStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownStripper {
    pub fn new() -> Self {
        Self {
            rule_regex: Regex::new(r"^\s*(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$")
                .expect("Invalid horizontal rule regex"),
            heading_regex: Regex::new(r"^\s{0,3}#{1,6}\s+").expect("Invalid heading regex"),
            bullet_regex: Regex::new(r"^(\s*)[-*+]\s+").expect("Invalid bullet regex"),
            strong_regex: Regex::new(
                r"(^|[^\w*])\*\*([^\s*](?:[^*\n]*?[^\s*])?)\*\*([^\w*]|$)",
            )
            .expect("Invalid strong emphasis regex"),
            emphasis_regex: Regex::new(
                r"(^|[^\w*])\*([^\s*](?:[^*\n]*?[^\s*])?)\*([^\w*]|$)",
            )
            .expect("Invalid emphasis regex"),
            underscore_strong_regex: Regex::new(
                r"(^|[^\w])__([^\s_](?:[^_\n]*?[^\s_])?)__([^\w]|$)",
            )
            .expect("Invalid underscore strong regex"),
            underscore_regex: Regex::new(r"(^|[^\w])_([^\s_](?:[^_\n]*?[^\s_])?)_([^\w]|$)")
                .expect("Invalid underscore emphasis regex"),
        }
    }

    pub fn strip(&self, text: &str) -> String {
        let lines: Vec<String> = text
            .lines()
            .map(|line| {
                if self.rule_regex.is_match(line) {
                    return String::new();
                }
                let line = self.heading_regex.replace(line, "");
                let line = self.bullet_regex.replace(&line, "$1");
                self.strip_emphasis(&line)
            })
            .collect();

        lines.join("\n").trim().to_string()
    }

    fn strip_emphasis(&self, line: &str) -> String {
        // Each match consumes the character after its closing delimiter, so
        // neighbouring spans like "*a* *b*" need another round.
        let mut current = line.to_string();
        loop {
            let next = unwrap_delimited(&self.strong_regex, &current, false);
            let next = unwrap_delimited(&self.emphasis_regex, &next, false);
            let next = unwrap_delimited(&self.underscore_strong_regex, &next, true);
            let next = unwrap_delimited(&self.underscore_regex, &next, true);
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

/// Replace each `(before)(inner)(after)` match with the text minus delimiters.
fn unwrap_delimited(regex: &Regex, line: &str, keep_identifiers: bool) -> String {
    regex
        .replace_all(line, |caps: &Captures| {
            let inner = &caps[2];
            if keep_identifiers && inner.chars().all(|c| c.is_alphanumeric() || c == '_') {
                caps[0].to_string()
            } else {
                format!("{}{}{}", &caps[1], inner, &caps[3])
            }
        })
        .into_owned()
}
