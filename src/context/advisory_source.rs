//! Performance advisories exposed as context sources
//!
//! Lets a regression reported by the performance monitor compete for space in
//! a context bundle next to regular knowledge sources.

use super::source::{ContextSource, SourceDescriptor, SourceError};
use crate::performance::PerformanceAdvisory;
use async_trait::async_trait;

const ADVISORY_PRIORITY: f64 = 0.6;
const ADVISORY_SUCCESS_RATE: f64 = 0.4;
const ADVISORY_CONFIDENCE: f64 = 0.4;
const ADVISORY_PROVENANCE: &str = "performance-monitor";

/// Context source rendering a single [`PerformanceAdvisory`]
#[derive(Debug, Clone)]
pub struct AdvisorySource {
    descriptor: SourceDescriptor,
    body: String,
}

impl AdvisorySource {
    /// `index` disambiguates several advisories for the same workflow
    pub fn from_advisory(advisory: &PerformanceAdvisory, index: usize) -> Self {
        let descriptor = SourceDescriptor::new(
            format!("advisory:{}:{}", advisory.workflow, index),
            ADVISORY_PRIORITY,
        )
        .with_tags([advisory.workflow.clone(), "telemetry".to_string()])
        .with_last_updated(advisory.timestamp)
        .with_success_rate(ADVISORY_SUCCESS_RATE)
        .with_pattern_confidence(ADVISORY_CONFIDENCE)
        .with_provenance(ADVISORY_PROVENANCE)
        .with_performance_delta(advisory.delta_pct);

        let body = [
            advisory.message.clone(),
            format!("Observed: {:.2}ms", advisory.observed),
            format!("Baseline: {:.2}ms", advisory.baseline),
            format!("Threshold: {:.0}%", advisory.threshold_pct * 100.0),
        ]
        .join("\n");

        Self { descriptor, body }
    }

    /// One source per advisory, in the given order
    pub fn from_advisories(advisories: &[PerformanceAdvisory]) -> Vec<Self> {
        advisories
            .iter()
            .enumerate()
            .map(|(index, advisory)| Self::from_advisory(advisory, index))
            .collect()
    }
}

#[async_trait]
impl ContextSource for AdvisorySource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn get_content(&self) -> Result<String, SourceError> {
        Ok(self.body.clone())
    }
}
