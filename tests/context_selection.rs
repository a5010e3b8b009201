//! End-to-end context selection through the public API

use chrono::{Duration, Utc};
use context_advisor::context::{FnSource, SourceError, Tokenizer, WeightOverrides};
use context_advisor::{
    AIContextManager, ContextManagerConfig, ContextSource, FileSource, SourceDescriptor,
    StaticSource,
};
use futures::FutureExt;
use std::io::Write;
use std::sync::Arc;

fn static_source(descriptor: SourceDescriptor, content: &str) -> Arc<dyn ContextSource> {
    Arc::new(StaticSource::new(descriptor, content))
}

fn scoring_weights() -> WeightOverrides {
    WeightOverrides {
        relevance: Some(0.3),
        recency: Some(0.1),
        success: Some(0.2),
        priority: Some(0.05),
        pattern_confidence: Some(0.25),
        performance: Some(0.1),
    }
}

#[tokio::test]
async fn test_pattern_confidence_boosts_and_performance_penalties() {
    let config = ContextManagerConfig::new(1200)
        .with_reserved_tokens(200)
        .with_weights(scoring_weights());
    let mut manager = AIContextManager::new(config).unwrap();

    manager.register_sources([
        static_source(
            SourceDescriptor::new("high-confidence-pattern", 0.9)
                .with_tags(["integration", "hexagonal"])
                .with_pattern_confidence(0.95)
                .with_success_rate(0.9)
                .with_provenance("ADR-018"),
            "Hexagonal architecture integration guidance.",
        ),
        static_source(
            SourceDescriptor::new("stale-source", 0.7)
                .with_tags(["integration", "hexagonal"])
                .with_pattern_confidence(0.6)
                .with_success_rate(0.6)
                .with_last_updated(Utc::now() - Duration::days(4)),
            "Older integration note.",
        ),
        static_source(
            SourceDescriptor::new("performance-regressed", 0.8)
                .with_tags(["integration", "latency"])
                .with_pattern_confidence(0.7)
                .with_success_rate(0.8)
                .with_performance_delta(0.45),
            "Context source with regression warning.",
        ),
    ]);

    let context = manager
        .get_optimal_context("Design integration strategy with hexagonal ports")
        .await;

    let first = &context.sources[0];
    assert_eq!(first.id, "high-confidence-pattern");
    let confidence = first.confidence.unwrap();
    assert!(confidence > 0.9 && confidence <= 1.0);

    assert!(context
        .sources
        .iter()
        .all(|source| source.id != "performance-regressed"));
    assert!(context.content.contains("Hexagonal architecture"));
    assert!(context.content.contains("Confidence:"));
    assert!(context.content.contains("Provenance: ADR-018"));
}

#[tokio::test]
async fn test_cache_reused_until_roster_changes() {
    let mut manager = AIContextManager::new(ContextManagerConfig::new(500)).unwrap();
    manager.register_source(static_source(
        SourceDescriptor::new("guide", 0.8).with_tags(["domain"]),
        "Domain guide for aggregates.",
    ));

    let first = manager.get_optimal_context("Model the domain").await;
    assert!(!first.from_cache);

    // Case and surrounding whitespace do not matter for reuse
    let second = manager.get_optimal_context("  model the DOMAIN ").await;
    assert!(second.from_cache);
    assert_eq!(second.content, first.content);
    assert_eq!(second.token_count, first.token_count);
    assert_eq!(second.sources, first.sources);

    manager.register_source(static_source(
        SourceDescriptor::new("extra", 0.5),
        "Unrelated material.",
    ));
    assert_eq!(manager.cached_entries(), 0);
    assert!(!manager.get_optimal_context("Model the domain").await.from_cache);

    assert!(manager.remove_source("extra"));
    assert_eq!(manager.cached_entries(), 0);
    assert!(!manager.get_optimal_context("Model the domain").await.from_cache);
}

#[tokio::test]
async fn test_failing_source_is_excluded_not_fatal() {
    let mut manager = AIContextManager::new(ContextManagerConfig::new(500)).unwrap();
    manager.register_source(Arc::new(FnSource::new(
        SourceDescriptor::new("exporter", 0.9).with_tags(["testing"]),
        || {
            async {
                Err::<String, _>(SourceError::Unavailable {
                    id: "exporter".to_string(),
                    reason: "connection refused".to_string(),
                })
            }
            .boxed()
        },
    )));
    manager.register_source(Arc::new(FnSource::new(
        SourceDescriptor::new("fixtures", 0.6).with_tags(["testing"]),
        || {
            async { Ok::<_, SourceError>("Shared test fixtures live in tests/common.".to_string()) }
                .boxed()
        },
    )));

    let context = manager.get_optimal_context("Write tests for fixtures").await;

    let ids: Vec<_> = context.sources.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["fixtures"]);
    assert!(context.content.contains("Shared test fixtures"));
    assert!(!manager.source_metrics().contains_key("exporter"));
}

#[tokio::test]
async fn test_file_source_and_missing_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Repository conventions: use hexagonal ports for adapters.").unwrap();

    let mut manager = AIContextManager::new(ContextManagerConfig::new(500)).unwrap();
    manager.register_source(Arc::new(FileSource::new(
        SourceDescriptor::new("conventions", 0.8).with_tags(["hexagonal"]),
        file.path(),
    )));
    manager.register_source(Arc::new(FileSource::new(
        SourceDescriptor::new("missing", 0.8).with_tags(["hexagonal"]),
        "/nonexistent/conventions.md",
    )));

    let context = manager.get_optimal_context("Add hexagonal adapter").await;

    assert_eq!(context.sources.len(), 1);
    assert_eq!(context.sources[0].id, "conventions");
    assert!(context.content.starts_with("### Source: conventions"));
}

#[tokio::test]
async fn test_selection_never_exceeds_available_budget() {
    let tokenizer = Tokenizer::new();
    // 240 tokens, more than any budget below, so every case truncates
    let body = "hexagonal ports adapters integration ".repeat(60);

    for (max_tokens, reserved) in [(40, 0), (120, 20), (250, 100), (1000, 999)] {
        let config = ContextManagerConfig::new(max_tokens).with_reserved_tokens(reserved);
        let mut manager = AIContextManager::new(config).unwrap();
        for i in 0..5 {
            manager.register_source(static_source(
                SourceDescriptor::new(format!("doc-{i}"), 0.9)
                    .with_tags(["hexagonal", "integration"])
                    .with_last_updated(Utc::now())
                    .with_success_rate(0.95)
                    .with_pattern_confidence(0.95),
                &body,
            ));
        }

        let context = manager
            .get_optimal_context("Hexagonal integration with ports and adapters")
            .await;

        let available = max_tokens - reserved;
        let summed: usize = context.sources.iter().map(|s| s.tokens).sum();
        assert!(context.token_count <= available, "budget {max_tokens}/{reserved}");
        assert_eq!(context.token_count, summed);
        assert!(tokenizer.count(&body) > available);
        assert_eq!(context.sources.len(), 1);
        assert_eq!(context.sources[0].tokens, available);
    }
}

#[tokio::test]
async fn test_tag_match_outranks_untagged_source() {
    let mut manager = AIContextManager::new(ContextManagerConfig::new(1000)).unwrap();
    manager.register_sources([
        static_source(
            SourceDescriptor::new("untagged", 0.7),
            "General notes about the project.",
        ),
        static_source(
            SourceDescriptor::new("testing-guide", 0.7).with_tags(["testing", "jest"]),
            "General notes about the project.",
        ),
    ]);

    let context = manager
        .get_optimal_context("Improve testing with jest snapshots")
        .await;

    assert_eq!(context.sources[0].id, "testing-guide");
    let metrics = manager.source_metrics();
    assert!(metrics["testing-guide"].score > metrics["untagged"].score);
}
