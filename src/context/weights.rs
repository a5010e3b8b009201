//! Ranking weights for the weighted source score
//!
//! Weights are merged from partial overrides onto the defaults and then
//! validated: every weight must be finite and non-negative, and together they
//! must sum to 1.0 within a small tolerance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SUM_TOLERANCE: f64 = 0.001;

/// Weight configuration for each ranking factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingWeights {
    pub relevance: f64,
    pub recency: f64,
    pub success: f64,
    pub priority: f64,
    pub pattern_confidence: f64,
    /// Applied as a subtraction
    pub performance: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            relevance: 0.4,
            recency: 0.15,
            success: 0.15,
            priority: 0.1,
            pattern_confidence: 0.15,
            performance: 0.05,
        }
    }
}

/// Partial override merged onto [`RankingWeights::default`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightOverrides {
    #[serde(default)]
    pub relevance: Option<f64>,
    #[serde(default)]
    pub recency: Option<f64>,
    #[serde(default)]
    pub success: Option<f64>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default, alias = "pattern_confidence")]
    pub pattern_confidence: Option<f64>,
    #[serde(default)]
    pub performance: Option<f64>,
}

/// Weight validation errors
#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("Weight for {name} must be a non-negative number, got {value}")]
    Invalid { name: &'static str, value: f64 },

    #[error("Weights must sum to 1.0, current sum is {sum:.4}")]
    Unbalanced { sum: f64 },
}

impl RankingWeights {
    /// Merge overrides onto the defaults and validate the result
    pub fn from_overrides(overrides: &WeightOverrides) -> Result<Self, WeightError> {
        let defaults = Self::default();
        let weights = Self {
            relevance: overrides.relevance.unwrap_or(defaults.relevance),
            recency: overrides.recency.unwrap_or(defaults.recency),
            success: overrides.success.unwrap_or(defaults.success),
            priority: overrides.priority.unwrap_or(defaults.priority),
            pattern_confidence: overrides
                .pattern_confidence
                .unwrap_or(defaults.pattern_confidence),
            performance: overrides.performance.unwrap_or(defaults.performance),
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightError::Invalid { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(WeightError::Unbalanced { sum });
        }

        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, value)| value).sum()
    }

    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("relevance", self.relevance),
            ("recency", self.recency),
            ("success", self.success),
            ("priority", self.priority),
            ("patternConfidence", self.pattern_confidence),
            ("performance", self.performance),
        ]
    }
}
