//! Track a few workflow runs, then assemble a context bundle that includes
//! any performance advisories they raised.
//!
//! Run with: cargo run --example advisory_bundle

use anyhow::Result;
use context_advisor::context::SourceDescriptor;
use context_advisor::logging::init_tracing;
use context_advisor::{
    AIContextManager, AdvisorySource, ContextSource, EngineConfig, PerformanceMonitor,
    StaticSource,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load(None)?;
    init_tracing(&config.logging);

    let dir = std::env::temp_dir().join("context-advisor-demo");
    let monitor = PerformanceMonitor::new(
        config
            .performance
            .clone()
            .with_baseline_path(dir.join("baselines.json")),
    )?;

    // A fast run seeds the baseline, a slow one regresses against it
    for delay in [20, 20, 45] {
        monitor
            .track(
                "context-loading",
                || tokio::time::sleep(Duration::from_millis(delay)),
                None,
            )
            .await;
    }

    let mut manager = AIContextManager::new(config.context.clone())?;
    manager.register_source(Arc::new(StaticSource::new(
        SourceDescriptor::new("architecture-guide", 0.9)
            .with_tags(["architecture", "hexagonal"])
            .with_last_updated(chrono::Utc::now())
            .with_success_rate(0.9)
            .with_pattern_confidence(0.85)
            .with_provenance("docs/architecture.md"),
        "Hexagonal architecture keeps the domain isolated behind ports and adapters.",
    )));
    manager.register_sources(
        AdvisorySource::from_advisories(&monitor.advisories())
            .into_iter()
            .map(|source| Arc::new(source) as Arc<dyn ContextSource>),
    );

    let bundle = manager
        .get_optimal_context("Speed up context loading in the hexagonal architecture workflow")
        .await;

    println!("=== Context bundle ({} tokens) ===", bundle.token_count);
    println!("{}", bundle.content);
    println!();
    println!("Relevance: {:.4}", bundle.relevance_score);
    for source in &bundle.sources {
        println!("  {} score={:.4} tokens={}", source.id, source.score, source.tokens);
    }

    println!();
    println!("=== Advisories ===");
    for advisory in monitor.advisories() {
        println!("[{}] {}", advisory.severity, advisory.message);
    }

    Ok(())
}
