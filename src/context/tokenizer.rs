//! Word-level tokenizer shared by ranking, budgeting and truncation
//!
//! Counting and truncation must agree with each other, so the budget is
//! expressed in the same unit everywhere: lower-cased alphanumeric words with
//! stop words removed.

use super::lexicon::STOP_WORDS;

/// Result of trimming text to a token budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub content: String,
    pub tokens: usize,
}

/// Deterministic stop-word filtering tokenizer
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Split text into lower-cased alphanumeric words, dropping stop words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty() && !STOP_WORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Number of tokens in the given text
    pub fn count(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }

    /// Trim text to at most `max_tokens` tokens.
    ///
    /// Text that already fits is returned trimmed but otherwise untouched;
    /// text that does not fit is rebuilt from its first `max_tokens` tokens.
    pub fn trim(&self, text: &str, max_tokens: usize) -> Truncated {
        if max_tokens == 0 {
            return Truncated {
                content: String::new(),
                tokens: 0,
            };
        }

        let tokens = self.tokenize(text);
        if tokens.len() <= max_tokens {
            return Truncated {
                content: text.trim().to_string(),
                tokens: tokens.len(),
            };
        }

        Truncated {
            content: tokens[..max_tokens].join(" "),
            tokens: max_tokens,
        }
    }
}
