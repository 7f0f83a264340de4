//! System prompt templates and instruction assembly

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ENGLISH_DIRECTIVE: &str = "Respond in English.";
pub const SPANISH_DIRECTIVE: &str = "Respond in Spanish.";

/// Response language of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// Permissive selector: "spanish" in any case picks Spanish, anything
    /// else falls back to English.
    pub fn from_selector(selector: &str) -> Self {
        if selector.trim().eq_ignore_ascii_case("spanish") {
            Language::Spanish
        } else {
            Language::English
        }
    }

    pub fn directive(&self) -> &'static str {
        match self {
            Language::English => ENGLISH_DIRECTIVE,
            Language::Spanish => SPANISH_DIRECTIVE,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Spanish => write!(f, "spanish"),
        }
    }
}

/// Built-in system prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptTemplate {
    /// Six-point expert review of terms, dates, obligations and risks.
    #[default]
    ContractReview,
    /// Ten-point review of whether the contract favors the user.
    FavorabilityReview,
}

impl PromptTemplate {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "contract-review" | "review" => Some(PromptTemplate::ContractReview),
            "favorability-review" | "favorability" => Some(PromptTemplate::FavorabilityReview),
            _ => None,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            PromptTemplate::ContractReview => CONTRACT_REVIEW_TEMPLATE,
            PromptTemplate::FavorabilityReview => FAVORABILITY_REVIEW_TEMPLATE,
        }
    }
}

/// `{system_prompt}\n{language_directive}`
pub fn build_instruction(system_prompt: &str, language: Language) -> String {
    format!("{}\n{}", system_prompt, language.directive())
}

const CONTRACT_REVIEW_TEMPLATE: &str = r#"You are a contract analysis expert. Analyze the provided contract and provide the following information:
1. Contract Type and Purpose
2. Key Terms and Conditions
3. Important Dates and Deadlines
4. Obligations and Responsibilities
5. Potential Risks or Red Flags
6. Recommendations"#;

const FAVORABILITY_REVIEW_TEMPLATE: &str = r#"Quiero que me ayudes a evaluar un contrato y determinar si es favorable para mí o si tengo alguna desventaja. Para el contrato proporcionado:

1. Identifica el propósito principal del contrato.
2. Determina las principales obligaciones y responsabilidades asignadas al usuario.
3. Evalúa los potenciales riesgos y desventajas para el usuario.
4. Analiza las cifras del contrato (por ejemplo, montos de pagos, plazos, penalizaciones, etc.) y determina si son razonables y favorables para el usuario.
5. Revisa las cláusulas de terminación y rescisión del contrato, incluyendo cualquier penalización por incumplimiento.
6. Evalúa las cláusulas de confidencialidad y no competencia, si aplican.
7. Verifica la claridad y comprensión de los términos y condiciones del contrato.
8. Identifica cualquier cláusula que pueda ser desfavorable para el usuario, como cláusulas de arbitraje obligatorio o limitaciones de responsabilidad.
9. Proporciona recomendaciones sobre la legislación del país de jurisdicción del contrato, incluyendo cualquier requisito legal específico que deba cumplirse.
10. Proporciona una recomendación sobre si el contrato es favorable o no.

Haz especial énfasis en la propiedad intelectual y las compensaciones, y presenta todas las observaciones como ideas principales y viñetas en formato Markdown."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_selector_is_case_insensitive() {
        for selector in ["spanish", "Spanish", "SPANISH", " sPaNiSh "] {
            assert_eq!(Language::from_selector(selector), Language::Spanish);
        }
    }

    #[test]
    fn test_unknown_selector_defaults_to_english() {
        for selector in ["english", "", "french", "espanol"] {
            assert_eq!(Language::from_selector(selector), Language::English);
        }
    }

    #[test]
    fn test_build_instruction() {
        let instruction = build_instruction("Review it.", Language::Spanish);
        assert_eq!(instruction, "Review it.\nRespond in Spanish.");

        let instruction = build_instruction("Review it.", Language::English);
        assert!(instruction.ends_with(ENGLISH_DIRECTIVE));
    }

    #[test]
    fn test_templates() {
        assert!(PromptTemplate::ContractReview.text().contains("Potential Risks or Red Flags"));
        let favorability = PromptTemplate::FavorabilityReview.text();
        assert!(favorability.contains("propiedad intelectual"));
        assert!(favorability.contains("10. Proporciona una recomendación"));
        assert!(favorability.contains("formato Markdown"));
        assert_eq!(PromptTemplate::parse("Favorability"), Some(PromptTemplate::FavorabilityReview));
        assert_eq!(PromptTemplate::parse("unknown"), None);
    }
}
