//! Context selection and performance advisories for AI-assisted development
//!
//! Two engines live in this crate:
//! - [`context`]: ranks registered knowledge sources against a task and packs
//!   the best of them into a token-budgeted bundle
//! - [`performance`]: keeps smoothed duration baselines per workflow and
//!   raises advisories when a run regresses

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod performance;

pub use config::EngineConfig;
pub use context::{
    AIContextManager, AdvisorySource, ContextManagerConfig, ContextSelectionResult, ContextSource,
    FileSource, SourceDescriptor, StaticSource,
};
pub use error::{ContextError, Result};
pub use performance::{
    MonitorConfig, PerformanceAdvisory, PerformanceMonitor, Severity, Thresholds,
};
