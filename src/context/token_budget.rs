//! Token budget enforcement for context selection
//!
//! Selection is greedy over the ranked list:
//! - available = max_tokens - reserved_tokens
//! - sources scoring below [`MIN_SCORE_THRESHOLD`] are skipped once something
//!   has been selected, so the best source is always eligible
//! - a source that does not fit is truncated to the remaining budget
//! - an empty selection falls back to the best source, truncated if needed

use super::models::RankedSource;
use super::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Score below which additional sources are not worth their tokens
pub const MIN_SCORE_THRESHOLD: f64 = 0.6;

/// Token budget configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudgetConfig {
    pub max_tokens: usize,
    #[serde(default)]
    pub reserved_tokens: usize,
}

impl TokenBudgetConfig {
    /// Validate that the budget configuration is consistent
    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.max_tokens == 0 {
            return Err(BudgetError::ZeroBudget);
        }

        if self.reserved_tokens >= self.max_tokens {
            return Err(BudgetError::ReservationTooLarge {
                reserved: self.reserved_tokens,
                max: self.max_tokens,
            });
        }

        Ok(())
    }

    /// Tokens available for source content
    pub fn available(&self) -> usize {
        self.max_tokens.saturating_sub(self.reserved_tokens)
    }
}

/// Token budget errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    #[error("maxTokens must be greater than zero")]
    ZeroBudget,

    #[error("reservedTokens ({reserved}) must be less than maxTokens ({max})")]
    ReservationTooLarge { reserved: usize, max: usize },
}

/// Greedy budget-constrained selector
#[derive(Debug, Clone)]
pub struct TokenBudgetManager {
    config: TokenBudgetConfig,
    tokenizer: Tokenizer,
}

impl TokenBudgetManager {
    /// Create a new token budget manager
    pub fn new(config: TokenBudgetConfig, tokenizer: Tokenizer) -> Result<Self, BudgetError> {
        config.validate()?;
        Ok(Self { config, tokenizer })
    }

    /// Get the configuration
    pub fn config(&self) -> &TokenBudgetConfig {
        &self.config
    }

    /// Select sources from a list sorted by descending score
    pub fn select(&self, ranked: &[RankedSource]) -> Vec<RankedSource> {
        let available = self.config.available();
        let mut remaining = available;
        let mut selected: Vec<RankedSource> = Vec::new();

        for entry in ranked {
            if remaining == 0 {
                break;
            }

            if entry.score < MIN_SCORE_THRESHOLD && !selected.is_empty() {
                continue;
            }

            if entry.tokens <= remaining {
                remaining -= entry.tokens;
                selected.push(entry.clone());
            } else {
                let truncated = self.tokenizer.trim(&entry.content, remaining);
                if truncated.tokens > 0 {
                    debug!(
                        "Truncated source {} from {} to {} tokens",
                        entry.descriptor.id, entry.tokens, truncated.tokens
                    );
                    remaining -= truncated.tokens;
                    selected.push(RankedSource {
                        content: truncated.content,
                        tokens: truncated.tokens,
                        ..entry.clone()
                    });
                }
            }
        }

        if selected.is_empty() {
            if let Some(best) = ranked.first() {
                debug!("No source selected, falling back to {}", best.descriptor.id);
                selected.push(self.fit(best, available));
            }
        }

        debug!(
            "Selected {} of {} sources using {} of {} tokens",
            selected.len(),
            ranked.len(),
            available - remaining.min(available),
            available
        );

        selected
    }

    fn fit(&self, entry: &RankedSource, budget: usize) -> RankedSource {
        if entry.tokens <= budget {
            return entry.clone();
        }

        let truncated = self.tokenizer.trim(&entry.content, budget);
        RankedSource {
            content: truncated.content,
            tokens: truncated.tokens,
            ..entry.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::source::SourceDescriptor;
    use std::sync::Arc;

    fn ranked(id: &str, score: f64, content: &str) -> RankedSource {
        RankedSource {
            descriptor: Arc::new(SourceDescriptor::new(id, 0.5)),
            score,
            tokens: Tokenizer::new().count(content),
            content: content.to_string(),
        }
    }

    fn manager(max_tokens: usize, reserved_tokens: usize) -> TokenBudgetManager {
        TokenBudgetManager::new(
            TokenBudgetConfig {
                max_tokens,
                reserved_tokens,
            },
            Tokenizer::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let zero = TokenBudgetConfig {
            max_tokens: 0,
            reserved_tokens: 0,
        };
        assert_eq!(zero.validate(), Err(BudgetError::ZeroBudget));

        let reserved = TokenBudgetConfig {
            max_tokens: 100,
            reserved_tokens: 100,
        };
        assert!(matches!(
            reserved.validate(),
            Err(BudgetError::ReservationTooLarge { .. })
        ));

        let ok = TokenBudgetConfig {
            max_tokens: 100,
            reserved_tokens: 99,
        };
        assert_eq!(ok.available(), 1);
    }

    #[test]
    fn test_whole_sources_until_budget_then_truncate() {
        let selected = manager(6, 1).select(&[
            ranked("a", 0.9, "one two three"),
            ranked("b", 0.8, "four five six seven"),
        ]);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].tokens, 3);
        assert_eq!(selected[1].tokens, 2);
        assert_eq!(selected[1].content, "four five");
    }

    #[test]
    fn test_low_scores_skipped_after_first_selection() {
        let selected = manager(100, 0).select(&[
            ranked("best", 0.65, "alpha beta"),
            ranked("weak", 0.55, "gamma delta"),
            ranked("late", 0.61, "epsilon"),
        ]);

        let ids: Vec<_> = selected.iter().map(|s| s.descriptor.id.as_str()).collect();
        assert_eq!(ids, vec!["best", "late"]);
    }

    #[test]
    fn test_first_source_eligible_below_threshold() {
        let selected = manager(100, 0).select(&[
            ranked("only", 0.2, "alpha beta"),
            ranked("worse", 0.1, "gamma"),
        ]);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].descriptor.id, "only");
    }

    #[test]
    fn test_empty_ranking_selects_nothing() {
        assert!(manager(10, 0).select(&[]).is_empty());
    }

    #[test]
    fn test_budget_never_exceeded() {
        let sources: Vec<_> = (0..10)
            .map(|i| ranked(&format!("s{i}"), 0.95 - i as f64 * 0.01, "w1 w2 w3 w4 w5 w6 w7"))
            .collect();

        for max in 1..40 {
            let selected = manager(max, max / 3).select(&sources);
            let used: usize = selected.iter().map(|s| s.tokens).sum();
            assert!(used <= max - max / 3, "used {used} of {max}");
            assert!(!selected.is_empty());
        }
    }
}
