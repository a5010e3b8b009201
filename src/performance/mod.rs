//! Workflow performance advisories
//!
//! Keeps an exponentially smoothed duration baseline per named workflow,
//! raises warn/critical advisories when a sample regresses past the
//! configured thresholds, and persists baselines as a JSON snapshot.

pub mod config;
pub mod models;
pub mod monitor;
pub mod sanitize;
pub mod store;

pub use config::{MonitorConfig, Thresholds};
pub use models::{
    BaselineEntry, BaselineFile, MeasureEntry, Metadata, PerformanceAdvisory, PerformanceSample,
    Severity,
};
pub use monitor::{PerformanceMonitor, SMOOTHING_ALPHA};
pub use sanitize::{sanitize_metadata, REDACTED};
pub use store::BaselineStore;
