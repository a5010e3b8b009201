//! Configuration for the performance monitor

use crate::error::{ContextError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MIN_HISTORY: usize = 5;

/// Regression thresholds, as fractions of the baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_warn")]
    pub warn: f64,

    #[serde(default = "default_critical")]
    pub critical: f64,
}

fn default_warn() -> f64 {
    0.25
}

fn default_critical() -> f64 {
    0.5
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn: default_warn(),
            critical: default_critical(),
        }
    }
}

/// Performance monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Baseline snapshot location; relative paths resolve against the
    /// working directory
    #[serde(default = "default_baseline_path")]
    pub baseline_path: PathBuf,

    #[serde(default)]
    pub thresholds: Thresholds,

    /// Write baselines after every sample
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Rolling history length (floored to 5)
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from("tmp/performance-baselines.json")
}

fn default_persist() -> bool {
    true
}

fn default_max_history() -> usize {
    40
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            baseline_path: default_baseline_path(),
            thresholds: Thresholds::default(),
            persist: default_persist(),
            max_history: default_max_history(),
        }
    }
}

impl MonitorConfig {
    pub fn with_baseline_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline_path = path.into();
        self
    }

    pub fn with_thresholds(mut self, warn: f64, critical: f64) -> Self {
        self.thresholds = Thresholds { warn, critical };
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Copy with an absolute baseline path and a floored history length
    pub(crate) fn resolved(&self) -> Result<Self> {
        Ok(Self {
            baseline_path: absolute(&self.baseline_path)?,
            max_history: self.max_history.max(MIN_HISTORY),
            ..self.clone()
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().map_err(|source| ContextError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.thresholds.warn, 0.25);
        assert_eq!(config.thresholds.critical, 0.5);
        assert!(config.persist);
        assert_eq!(config.max_history, 40);
    }

    #[test]
    fn test_resolved_paths_are_absolute_and_history_floored() {
        let config = MonitorConfig::default().with_max_history(2).resolved().unwrap();
        assert!(config.baseline_path.is_absolute());
        assert!(config.baseline_path.ends_with("tmp/performance-baselines.json"));
        assert_eq!(config.max_history, 5);
    }

    #[test]
    fn test_partial_thresholds_deserialize_with_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"thresholds": {"warn": 0.1}, "persist": false}"#).unwrap();
        assert_eq!(config.thresholds.warn, 0.1);
        assert_eq!(config.thresholds.critical, 0.5);
        assert!(!config.persist);
    }
}
