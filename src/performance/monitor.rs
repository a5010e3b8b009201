//! Workflow duration tracking with smoothed baselines and regression advisories
//!
//! Every sample is compared against the baseline that existed *before* the
//! sample, so a workflow's first sample only seeds its baseline. Baselines
//! are smoothed with a fixed factor: `baseline = 0.8 * old + 0.2 * sample`.

use super::config::MonitorConfig;
use super::models::{
    BaselineEntry, BaselineFile, MeasureEntry, Metadata, PerformanceAdvisory, PerformanceSample,
    Severity,
};
use super::sanitize::sanitize_metadata;
use super::store::{BaselineStore, Snapshot};
use crate::error::Result;
use crate::metrics::METRICS;
use chrono::Utc;
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Smoothing factor applied to new samples
pub const SMOOTHING_ALPHA: f64 = 0.2;

#[derive(Debug, Default)]
struct MonitorState {
    baselines: BTreeMap<String, BaselineEntry>,
    history: VecDeque<PerformanceSample>,
    advisories: Vec<PerformanceAdvisory>,
    generation: u64,
}

/// Tracks workflow durations and raises advisories on regressions
#[derive(Debug)]
pub struct PerformanceMonitor {
    config: MonitorConfig,
    store: BaselineStore,
    state: Mutex<MonitorState>,
}

impl PerformanceMonitor {
    /// Create a monitor, loading any baselines already on disk.
    ///
    /// A missing baseline file is fine; an unreadable or corrupt one is an
    /// error.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let config = config.resolved()?;
        let store = BaselineStore::new(&config.baseline_path);
        let baselines = store.load()?;

        info!(
            "Performance monitor loaded {} baseline(s) from {}",
            baselines.len(),
            store.path().display()
        );

        Ok(Self {
            config,
            store,
            state: Mutex::new(MonitorState {
                baselines,
                ..Default::default()
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run `work`, time it, and record the duration under `workflow`
    pub async fn track<F, Fut, T>(&self, workflow: &str, work: F, metadata: Option<Metadata>) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let started = Instant::now();
        let output = work().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;

        self.record_sample(workflow, elapsed_ms, metadata);
        output
    }

    /// Record a duration in milliseconds; returns the advisory it raised.
    ///
    /// Non-finite or negative durations are dropped.
    pub fn record_sample(
        &self,
        workflow: &str,
        duration_ms: f64,
        metadata: Option<Metadata>,
    ) -> Option<PerformanceAdvisory> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            debug!("Dropping invalid duration {} for {}", duration_ms, workflow);
            METRICS.record_sample(false);
            return None;
        }
        METRICS.record_sample(true);

        let metadata = metadata.as_ref().map(sanitize_metadata);
        let now = Utc::now();

        let (advisory, snapshot) = {
            let mut state = self.lock();

            state.history.push_back(PerformanceSample {
                workflow: workflow.to_string(),
                duration_ms,
                recorded_at: now,
                metadata: metadata.clone(),
            });
            while state.history.len() > self.config.max_history {
                state.history.pop_front();
            }

            let prior = state.baselines.get(workflow).copied();
            let advisory = prior.and_then(|prior| {
                self.evaluate(workflow, prior.baseline, duration_ms, metadata.clone())
            });

            let updated = match prior {
                Some(prior) => BaselineEntry {
                    baseline: prior.baseline * (1.0 - SMOOTHING_ALPHA) + duration_ms * SMOOTHING_ALPHA,
                    samples: prior.samples + 1,
                    last_observed: now.timestamp_millis(),
                },
                None => BaselineEntry {
                    baseline: duration_ms,
                    samples: 1,
                    last_observed: now.timestamp_millis(),
                },
            };
            state.baselines.insert(workflow.to_string(), updated);

            if let Some(advisory) = &advisory {
                state.advisories.push(advisory.clone());
            }

            state.generation += 1;
            let snapshot = self.config.persist.then(|| Snapshot {
                generation: state.generation,
                file: BaselineFile {
                    baselines: state.baselines.clone(),
                },
            });

            (advisory, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.store.persist(snapshot);
        }

        if let Some(advisory) = &advisory {
            warn!(
                workflow = %advisory.workflow,
                severity = %advisory.severity,
                "{}",
                advisory.message
            );
            METRICS.record_advisory(advisory.severity);
        }

        advisory
    }

    /// Record an externally produced `{workflow}-duration` measurement.
    ///
    /// Returns false for entries that do not follow the naming scheme.
    pub fn ingest_measure(&self, entry: &MeasureEntry) -> bool {
        match entry.workflow() {
            Some(workflow) => {
                self.record_sample(workflow, entry.duration_ms, None);
                true
            }
            None => {
                debug!("Ignoring measure {}", entry.name);
                false
            }
        }
    }

    /// Ingest measurements from a channel until every sender is dropped
    pub fn observe_measures(
        self: &Arc<Self>,
        mut measures: mpsc::UnboundedReceiver<MeasureEntry>,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(entry) = measures.recv().await {
                monitor.ingest_measure(&entry);
            }
            debug!("Measure channel closed");
        })
    }

    /// Accumulated advisories, largest regression first
    pub fn advisories(&self) -> Vec<PerformanceAdvisory> {
        let mut advisories = self.lock().advisories.clone();
        advisories.sort_by(|a, b| b.delta_pct.total_cmp(&a.delta_pct));
        advisories
    }

    pub fn clear_advisories(&self) {
        self.lock().advisories.clear();
    }

    pub fn baselines(&self) -> BTreeMap<String, BaselineEntry> {
        self.lock().baselines.clone()
    }

    pub fn baseline(&self, workflow: &str) -> Option<BaselineEntry> {
        self.lock().baselines.get(workflow).copied()
    }

    /// Recent samples, oldest first
    pub fn history(&self) -> Vec<PerformanceSample> {
        self.lock().history.iter().cloned().collect()
    }

    fn evaluate(
        &self,
        workflow: &str,
        baseline: f64,
        observed: f64,
        metadata: Option<Metadata>,
    ) -> Option<PerformanceAdvisory> {
        let delta = (observed - baseline) / baseline.max(1.0);
        let thresholds = &self.config.thresholds;

        let (severity, threshold) = if delta >= thresholds.critical {
            (Severity::Critical, thresholds.critical)
        } else if delta >= thresholds.warn {
            (Severity::Warn, thresholds.warn)
        } else {
            return None;
        };

        Some(PerformanceAdvisory {
            id: Uuid::new_v4(),
            workflow: workflow.to_string(),
            severity,
            baseline,
            observed,
            delta_pct: delta,
            threshold_pct: threshold,
            message: format!(
                "{} took {:.2}ms, {:.1}% slower than its {:.2}ms baseline ({} threshold {:.0}%)",
                workflow,
                observed,
                delta * 100.0,
                baseline,
                severity,
                threshold * 100.0
            ),
            timestamp: Utc::now(),
            metadata,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
