//! Data models for context selection

use super::source::SourceDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A source scored against the current task, with its fetched body
#[derive(Debug, Clone)]
pub struct RankedSource {
    pub descriptor: Arc<SourceDescriptor>,
    /// Weighted score (0.0-1.0)
    pub score: f64,
    pub tokens: usize,
    pub content: String,
}

/// Last ranking outcome for a registered source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetrics {
    pub token_cost: usize,
    pub score: f64,
    pub confidence: f64,
}

/// Per-source entry in a selection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSourceSummary {
    pub id: String,
    pub score: f64,
    pub tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_delta: Option<f64>,
}

impl SelectedSourceSummary {
    pub(crate) fn from_ranked(entry: &RankedSource) -> Self {
        Self {
            id: entry.descriptor.id.clone(),
            score: round4(entry.score),
            tokens: entry.tokens,
            confidence: entry.descriptor.pattern_confidence,
            provenance: entry.descriptor.provenance.clone(),
            performance_delta: entry.descriptor.performance_delta,
        }
    }
}

/// Context bundle returned by [`AIContextManager::get_optimal_context`]
///
/// [`AIContextManager::get_optimal_context`]: super::AIContextManager::get_optimal_context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSelectionResult {
    pub content: String,
    /// Budgeted payload tokens of the selected sources
    pub token_count: usize,
    /// Token-weighted mean of the selected scores
    pub relevance_score: f64,
    pub sources: Vec<SelectedSourceSummary>,
    pub from_cache: bool,
}

/// Cached form of a selection result
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CachedContext {
    pub content: String,
    pub token_count: usize,
    pub relevance_score: f64,
    pub sources: Vec<SelectedSourceSummary>,
}

impl CachedContext {
    pub fn from_result(result: &ContextSelectionResult) -> Self {
        Self {
            content: result.content.clone(),
            token_count: result.token_count,
            relevance_score: result.relevance_score,
            sources: result.sources.clone(),
        }
    }

    pub fn to_result(&self, from_cache: bool) -> ContextSelectionResult {
        ContextSelectionResult {
            content: self.content.clone(),
            token_count: self.token_count,
            relevance_score: self.relevance_score,
            sources: self.sources.clone(),
            from_cache,
        }
    }
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
