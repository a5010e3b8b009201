//! Data models for workflow performance tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Free-form sample metadata; sanitized before it is stored
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Advisory severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smoothed expected duration for one workflow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntry {
    /// Milliseconds
    pub baseline: f64,
    pub samples: u64,
    /// Epoch milliseconds of the latest sample
    pub last_observed: i64,
}

/// On-disk baseline snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineFile {
    #[serde(default)]
    pub baselines: BTreeMap<String, BaselineEntry>,
}

/// Warning raised when a workflow runs slower than its baseline allows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAdvisory {
    pub id: Uuid,
    pub workflow: String,
    pub severity: Severity,
    /// Baseline the sample was compared against, in milliseconds
    pub baseline: f64,
    /// Observed duration in milliseconds
    pub observed: f64,
    /// Fractional slowdown relative to the baseline
    pub delta_pct: f64,
    /// Threshold that was crossed
    pub threshold_pct: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Entry in the rolling sample history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub workflow: String,
    pub duration_ms: f64,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Externally produced timing measurement, named `{workflow}-duration`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureEntry {
    pub name: String,
    pub duration_ms: f64,
}

impl MeasureEntry {
    pub fn new(name: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            duration_ms,
        }
    }

    /// Measurement for `workflow`, using the recognized naming scheme
    pub fn for_workflow(workflow: &str, duration_ms: f64) -> Self {
        Self::new(format!("{workflow}-duration"), duration_ms)
    }

    /// Workflow this measurement belongs to, if the name follows the scheme
    pub fn workflow(&self) -> Option<&str> {
        self.name
            .strip_suffix("-duration")
            .filter(|workflow| !workflow.is_empty())
    }
}
