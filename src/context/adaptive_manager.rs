//! Context manager: task analysis, ranking, budgeted selection and caching
//!
//! A call to [`AIContextManager::get_optimal_context`] runs
//! analyze → rank → select → compose on a cache miss and stores the result.
//! Any change to the source roster clears the whole cache; the cache key
//! already carries a fingerprint of every source, so targeted invalidation
//! is not attempted.

use super::cache::{cache_key, fingerprint, ContextCache, DEFAULT_CACHE_SIZE};
use super::composer::{aggregate_score, compose_context};
use super::models::{round4, ContextSelectionResult, SelectedSourceSummary, SourceMetrics};
use super::ranker::SourceRanker;
use super::source::{ContextSource, RegisteredSource};
use super::task_analysis::{TaskAnalysis, TaskAnalyzer};
use super::token_budget::{TokenBudgetConfig, TokenBudgetManager};
use super::tokenizer::Tokenizer;
use super::weights::{RankingWeights, WeightOverrides};
use crate::error::{ContextError, Result};
use crate::metrics::METRICS;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Context manager configuration
///
/// `max_tokens` is required when deserialized; `Default` is only used when
/// the whole section is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextManagerConfig {
    pub max_tokens: usize,

    #[serde(default)]
    pub reserved_tokens: usize,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    #[serde(default)]
    pub weights: WeightOverrides,
}

fn default_max_tokens() -> usize {
    1600
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

impl Default for ContextManagerConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            reserved_tokens: 0,
            cache_size: default_cache_size(),
            weights: WeightOverrides::default(),
        }
    }
}

impl ContextManagerConfig {
    /// Configuration with the given budget, no reservation and default weights
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            reserved_tokens: 0,
            cache_size: default_cache_size(),
            weights: WeightOverrides::default(),
        }
    }

    pub fn with_reserved_tokens(mut self, reserved_tokens: usize) -> Self {
        self.reserved_tokens = reserved_tokens;
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn with_weights(mut self, weights: WeightOverrides) -> Self {
        self.weights = weights;
        self
    }
}

/// Assembles token-budgeted context bundles from registered sources
pub struct AIContextManager {
    analyzer: TaskAnalyzer,
    ranker: SourceRanker,
    budget: TokenBudgetManager,
    sources: IndexMap<String, RegisteredSource>,
    metrics: Mutex<HashMap<String, SourceMetrics>>,
    cache: Mutex<ContextCache>,
}

impl AIContextManager {
    /// Create a manager; invalid budgets or weights are rejected
    pub fn new(config: ContextManagerConfig) -> Result<Self> {
        let tokenizer = Tokenizer::new();
        let budget = TokenBudgetManager::new(
            TokenBudgetConfig {
                max_tokens: config.max_tokens,
                reserved_tokens: config.reserved_tokens,
            },
            tokenizer,
        )
        .map_err(|e| ContextError::Configuration(e.to_string()))?;
        let weights = RankingWeights::from_overrides(&config.weights)?;

        debug!(
            "Context manager ready: max_tokens={}, reserved={}, cache_size={}",
            config.max_tokens,
            config.reserved_tokens,
            config.cache_size.max(1)
        );

        Ok(Self {
            analyzer: TaskAnalyzer::new(tokenizer),
            ranker: SourceRanker::new(weights, tokenizer),
            budget,
            sources: IndexMap::new(),
            metrics: Mutex::new(HashMap::new()),
            cache: Mutex::new(ContextCache::new(config.cache_size)),
        })
    }

    /// Register or replace a source by id
    pub fn register_source(&mut self, source: Arc<dyn ContextSource>) {
        let entry = RegisteredSource::new(source);
        debug!("Registering context source {}", entry.descriptor.id);
        self.sources.insert(entry.descriptor.id.clone(), entry);
        self.clear_cache();
    }

    pub fn register_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = Arc<dyn ContextSource>>,
    {
        for source in sources {
            self.register_source(source);
        }
    }

    /// Remove a source; returns whether it was registered
    pub fn remove_source(&mut self, source_id: &str) -> bool {
        let removed = self.sources.shift_remove(source_id).is_some();
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(source_id);
        self.clear_cache();
        removed
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Token cost, score and confidence from each source's latest ranking
    pub fn source_metrics(&self) -> HashMap<String, SourceMetrics> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn weights(&self) -> &RankingWeights {
        self.ranker.weights()
    }

    pub fn analyze_task(&self, task: &str) -> TaskAnalysis {
        self.analyzer.analyze(task)
    }

    /// Build (or reuse) the best context bundle for a task
    pub async fn get_optimal_context(&self, task: &str) -> ContextSelectionResult {
        let key = cache_key(
            task,
            &fingerprint(self.sources.values().map(|entry| entry.descriptor.as_ref())),
        );

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key);
        if let Some(hit) = cached {
            debug!("Context cache hit for task '{}'", task.trim());
            METRICS.record_cache_lookup(true);
            return hit;
        }
        METRICS.record_cache_lookup(false);

        let analysis = self.analyzer.analyze(task);
        debug!(
            "Task analysis: type={:?}, complexity={:?}, keywords={}, domains={:?}, patterns={:?}",
            analysis.task_type,
            analysis.complexity,
            analysis.keywords.len(),
            analysis.domains,
            analysis.required_patterns
        );

        let roster: Vec<RegisteredSource> = self.sources.values().cloned().collect();
        let outcome = self.ranker.rank(&roster, &analysis, Utc::now()).await;
        if !outcome.failures.is_empty() {
            warn!(
                "{} context source(s) failed to load: {:?}",
                outcome.failures.len(),
                outcome.failures
            );
            METRICS.record_source_failures(outcome.failures.len());
        }

        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcome.metrics);

        let selected = self.budget.select(&outcome.ranked);
        let token_count: usize = selected.iter().map(|entry| entry.tokens).sum();
        let result = ContextSelectionResult {
            content: compose_context(&selected),
            token_count,
            relevance_score: round4(aggregate_score(&selected)),
            sources: selected.iter().map(SelectedSourceSummary::from_ranked).collect(),
            from_cache: false,
        };

        info!(
            "Selected {} source(s), {} tokens of {} available, relevance {:.4}",
            result.sources.len(),
            token_count,
            self.budget.config().available(),
            result.relevance_score
        );
        METRICS.record_selection(token_count, self.budget.config().available());

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .store(key, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::source::{SourceDescriptor, StaticSource};
    use chrono::Duration;

    fn source(descriptor: SourceDescriptor, content: &str) -> Arc<dyn ContextSource> {
        Arc::new(StaticSource::new(descriptor, content))
    }

    #[test]
    fn test_rejects_invalid_budgets() {
        assert!(AIContextManager::new(ContextManagerConfig::new(0)).is_err());
        assert!(
            AIContextManager::new(ContextManagerConfig::new(100).with_reserved_tokens(100)).is_err()
        );
        assert!(AIContextManager::new(ContextManagerConfig::new(100).with_reserved_tokens(99)).is_ok());
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let config = ContextManagerConfig::new(100).with_weights(WeightOverrides {
            relevance: Some(0.9),
            ..Default::default()
        });
        assert!(matches!(
            AIContextManager::new(config),
            Err(ContextError::Configuration(_))
        ));
    }

    #[test]
    fn test_deserialized_config_requires_max_tokens_only() {
        let config: ContextManagerConfig = serde_json::from_str(r#"{"max_tokens": 150}"#).unwrap();
        assert_eq!(config.reserved_tokens, 0);
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
        assert!(AIContextManager::new(config).is_ok());

        assert!(serde_json::from_str::<ContextManagerConfig>(r#"{"reserved_tokens": 10}"#).is_err());
    }

    #[tokio::test]
    async fn test_optimal_context_within_budget() {
        let mut manager =
            AIContextManager::new(ContextManagerConfig::new(8000).with_reserved_tokens(2000)).unwrap();
        manager.register_sources([
            source(
                SourceDescriptor::new("domain-user-guide", 0.95)
                    .with_tags(["domain:user", "entity", "validation"])
                    .with_last_updated(Utc::now() - Duration::minutes(5))
                    .with_success_rate(0.98),
                "User entity guidelines with invariants, validation rules, aggregate boundaries, and ubiquitous language.",
            ),
            source(
                SourceDescriptor::new("architecture-patterns", 0.85)
                    .with_tags(["hexagonal", "port-adapter", "application"])
                    .with_last_updated(Utc::now() - Duration::minutes(60))
                    .with_success_rate(0.9),
                "Hexagonal architecture guidance focusing on use case orchestration and domain isolation.",
            ),
            source(
                SourceDescriptor::new("irrelevant-notes", 0.2)
                    .with_tags(["frontend", "styling"])
                    .with_last_updated(Utc::now())
                    .with_success_rate(0.1),
                "Styling tips for marketing pages.",
            ),
        ]);

        let context = manager
            .get_optimal_context("Create user entity with validation and domain events")
            .await;

        let ids: Vec<_> = context.sources.iter().map(|s| s.id.as_str()).collect();
        assert!(context.token_count <= 6000);
        assert!(context.relevance_score > 0.8);
        assert!(ids.contains(&"domain-user-guide"));
        assert!(!ids.contains(&"irrelevant-notes"));
        assert!(!context.from_cache);
    }

    #[tokio::test]
    async fn test_source_metrics_track_last_ranking() {
        let mut manager = AIContextManager::new(ContextManagerConfig::new(100)).unwrap();
        manager.register_source(source(
            SourceDescriptor::new("a", 0.5).with_pattern_confidence(0.8),
            "alpha beta gamma",
        ));
        manager.get_optimal_context("alpha").await;

        let metrics = manager.source_metrics();
        let entry = metrics.get("a").unwrap();
        assert_eq!(entry.token_cost, 3);
        assert_eq!(entry.confidence, 0.8);

        assert!(manager.remove_source("a"));
        assert!(manager.source_metrics().is_empty());
        assert!(!manager.remove_source("a"));
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty_bundle() {
        let manager = AIContextManager::new(ContextManagerConfig::new(100)).unwrap();
        let context = manager.get_optimal_context("anything").await;
        assert!(context.content.is_empty());
        assert_eq!(context.token_count, 0);
        assert_eq!(context.relevance_score, 0.0);
        assert!(context.sources.is_empty());
    }

    #[tokio::test]
    async fn test_register_replaces_same_id() {
        let mut manager = AIContextManager::new(ContextManagerConfig::new(100)).unwrap();
        manager.register_source(source(SourceDescriptor::new("a", 0.5), "first"));
        manager.register_source(source(SourceDescriptor::new("a", 0.5), "second"));
        assert_eq!(manager.source_count(), 1);

        let context = manager.get_optimal_context("task").await;
        assert!(context.content.contains("second"));
    }
}
