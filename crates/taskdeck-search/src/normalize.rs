//! Text normalization and tokenization

use serde::{Deserialize, Serialize};

/// Lower-case `text`, trim it and collapse internal whitespace runs to one space.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `text` into normalized tokens on whitespace and punctuation.
pub fn tokenize(text: &str) -> Vec<String> {
    NormalizedText::new(text).tokens
}

/// A field in its comparable form: the normalized string and its tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub tokens: Vec<String>,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let text = normalize(raw);
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        Self { text, tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Contiguous substring match of `needle` within this field
    pub fn contains_phrase(&self, needle: &NormalizedText) -> bool {
        !needle.is_empty() && self.text.contains(&needle.text)
    }

    /// Every token of `needle` prefixes some token of this field, in any order
    pub fn contains_tokens(&self, needle: &NormalizedText) -> bool {
        !needle.tokens.is_empty()
            && needle
                .tokens
                .iter()
                .all(|wanted| self.tokens.iter().any(|token| token.starts_with(wanted.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Deploy   Pipeline\t\nNOW "), "deploy pipeline now");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("Q3-report: draft/v2"),
            vec!["q3", "report", "draft", "v2"]
        );
        assert!(tokenize("--- !!").is_empty());
    }

    #[test]
    fn test_contains_phrase() {
        let field = NormalizedText::new("Quarterly Report Draft");
        assert!(field.contains_phrase(&NormalizedText::new("report dr")));
        assert!(!field.contains_phrase(&NormalizedText::new("report quarterly")));
        assert!(!field.contains_phrase(&NormalizedText::new("  ")));
    }

    #[test]
    fn test_contains_tokens_any_order() {
        let field = NormalizedText::new("Quarterly Report Draft");
        assert!(field.contains_tokens(&NormalizedText::new("report quarterly")));
        assert!(field.contains_tokens(&NormalizedText::new("dra quar")));
        assert!(!field.contains_tokens(&NormalizedText::new("report annual")));
        assert!(!field.contains_tokens(&NormalizedText::new("")));
    }

    #[test]
    fn test_non_ascii_folding() {
        assert_eq!(normalize("ÉQUIPE Ünd"), "équipe ünd");
    }
}
