//! Weighted multi-factor ranking of registered sources
//!
//! Score = relevance·wR + recency·wC + success·wS + priority·wP
//!       + patternConfidence·wPC − performancePenalty·wPerf, clamped to [0, 1].
//!
//! Content fetches are isolated per source: a source whose fetch fails is
//! left out of the ranking and reported in [`RankingOutcome::failures`],
//! while every other source is still ranked.

use super::lexicon::TAG_SEPARATORS;
use super::models::{RankedSource, SourceMetrics};
use super::source::{clamp_unit, RegisteredSource, SourceDescriptor};
use super::task_analysis::TaskAnalysis;
use super::tokenizer::Tokenizer;
use super::weights::RankingWeights;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::{debug, warn};

const NO_TAG_COVERAGE: f64 = 0.4;
const TAG_WEIGHT: f64 = 0.7;
const CONTENT_WEIGHT: f64 = 0.3;
const DOMAIN_BONUS: f64 = 0.1;
const PATTERN_BONUS: f64 = 0.05;
const FULL_TAG_MATCH_BONUS: f64 = 0.15;
const NEUTRAL_SCORE: f64 = 0.5;

/// Output of a ranking pass
#[derive(Debug, Default)]
pub struct RankingOutcome {
    /// Sorted by descending score; ties keep registration order
    pub ranked: Vec<RankedSource>,
    pub metrics: Vec<(String, SourceMetrics)>,
    /// Ids of sources whose content could not be fetched
    pub failures: Vec<String>,
}

/// Scores sources against a task analysis
#[derive(Debug, Clone)]
pub struct SourceRanker {
    weights: RankingWeights,
    tokenizer: Tokenizer,
}

impl SourceRanker {
    pub fn new(weights: RankingWeights, tokenizer: Tokenizer) -> Self {
        Self { weights, tokenizer }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Fetch every source's content and rank the ones that produced a body.
    ///
    /// Fetches are polled concurrently on the calling task with no spawned
    /// work. Results are consumed in registration order, so the output does
    /// not depend on which fetch finishes first.
    pub async fn rank(
        &self,
        sources: &[RegisteredSource],
        analysis: &TaskAnalysis,
        now: DateTime<Utc>,
    ) -> RankingOutcome {
        let fetched = join_all(sources.iter().map(|entry| entry.source.get_content())).await;

        let mut outcome = RankingOutcome::default();
        for (entry, content) in sources.iter().zip(fetched) {
            let content = match content {
                Ok(content) => content.trim().to_string(),
                Err(err) => {
                    warn!("Excluding source {} from ranking: {}", entry.descriptor.id, err);
                    outcome.failures.push(entry.descriptor.id.clone());
                    continue;
                }
            };

            if content.is_empty() {
                debug!("Skipping source {} with empty content", entry.descriptor.id);
                continue;
            }

            let tokens = self.tokenizer.count(&content);
            let score = self.score(&entry.descriptor, analysis, &content, now);

            debug!(
                "Ranked source {}: score={:.4}, tokens={}",
                entry.descriptor.id, score, tokens
            );

            outcome.metrics.push((
                entry.descriptor.id.clone(),
                SourceMetrics {
                    token_cost: tokens,
                    score,
                    confidence: pattern_confidence_score(&entry.descriptor),
                },
            ));
            outcome.ranked.push(RankedSource {
                descriptor: entry.descriptor.clone(),
                score,
                tokens,
                content,
            });
        }

        outcome.ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        outcome
    }

    /// Weighted score for one source
    pub fn score(
        &self,
        descriptor: &SourceDescriptor,
        analysis: &TaskAnalysis,
        content: &str,
        now: DateTime<Utc>,
    ) -> f64 {
        let w = &self.weights;
        let weighted = self.relevance(descriptor, analysis, content) * w.relevance
            + recency_score(descriptor.last_updated, now) * w.recency
            + success_score(descriptor) * w.success
            + clamp_unit(descriptor.priority) * w.priority
            + pattern_confidence_score(descriptor) * w.pattern_confidence;

        clamp_unit(weighted - performance_penalty(descriptor) * w.performance)
    }

    /// Tag coverage, content overlap and affinity bonuses, clamped to [0, 1]
    pub fn relevance(
        &self,
        descriptor: &SourceDescriptor,
        analysis: &TaskAnalysis,
        content: &str,
    ) -> f64 {
        let terms = analysis.match_terms();
        let tags = expand_tags(&descriptor.tags);

        let tag_matches = tags.iter().filter(|tag| terms.contains(tag.as_str())).count();
        let tag_coverage = if tags.is_empty() {
            NO_TAG_COVERAGE
        } else {
            tag_matches as f64 / tags.len() as f64
        };

        let content_tokens: HashSet<String> = self.tokenizer.tokenize(content).into_iter().collect();
        let content_matches = content_tokens
            .iter()
            .filter(|token| terms.contains(token.as_str()))
            .count();
        let content_score = (content_matches as f64 / terms.len().max(1) as f64).min(1.0);

        let mut base = tag_coverage * TAG_WEIGHT + content_score * CONTENT_WEIGHT;
        if analysis.domains.iter().any(|domain| tags.contains(domain)) {
            base += DOMAIN_BONUS;
        }
        if analysis
            .required_patterns
            .iter()
            .any(|pattern| tags.contains(pattern))
        {
            base += PATTERN_BONUS;
        }
        if !tags.is_empty() && tag_matches == tags.len() {
            base += FULL_TAG_MATCH_BONUS;
        }

        clamp_unit(base + (clamp_unit(descriptor.priority) * 0.1).min(0.1))
    }
}

/// Step function of source age; unknown age is neutral
pub fn recency_score(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_updated) = last_updated else {
        return NEUTRAL_SCORE;
    };

    let age_minutes = (now - last_updated).num_milliseconds() as f64 / 60_000.0;
    match age_minutes {
        m if m <= 60.0 => 1.0,
        m if m <= 360.0 => 0.85,
        m if m <= 1_440.0 => 0.7,
        m if m <= 4_320.0 => 0.5,
        _ => 0.3,
    }
}

fn success_score(descriptor: &SourceDescriptor) -> f64 {
    descriptor.success_rate.map_or(NEUTRAL_SCORE, clamp_unit)
}

fn pattern_confidence_score(descriptor: &SourceDescriptor) -> f64 {
    descriptor.pattern_confidence.map_or(NEUTRAL_SCORE, clamp_unit)
}

fn performance_penalty(descriptor: &SourceDescriptor) -> f64 {
    match descriptor.performance_delta {
        Some(delta) if delta > 0.0 => clamp_unit(delta),
        _ => 0.0,
    }
}

/// Lower-cased tags plus their separator-delimited parts
fn expand_tags(tags: &[String]) -> IndexSet<String> {
    let mut expanded = IndexSet::new();
    for tag in tags {
        let lower = tag.to_lowercase();
        for part in lower.split(TAG_SEPARATORS.as_slice()) {
            if !part.is_empty() {
                expanded.insert(part.to_string());
            }
        }
        expanded.insert(lower);
    }
    expanded
}
