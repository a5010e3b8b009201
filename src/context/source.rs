//! Knowledge sources that can be ranked and packed into a context bundle
//!
//! A source is a descriptor (ranking metadata) plus a lazily fetched body.
//! Fetching is async so sources can be backed by files, exporters or
//! anything else that has to be awaited.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Content fetch errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source {id} unavailable: {reason}")]
    Unavailable { id: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ranking metadata attached to every source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub id: String,
    /// Caller-assigned importance (0.0-1.0)
    pub priority: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Historical success rate (0.0-1.0)
    #[serde(default)]
    pub success_rate: Option<f64>,
    /// Confidence of the pattern this source documents (0.0-1.0)
    #[serde(default)]
    pub pattern_confidence: Option<f64>,
    #[serde(default)]
    pub provenance: Option<String>,
    /// Fractional slowdown observed for the workflow behind this source
    #[serde(default)]
    pub performance_delta: Option<f64>,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<String>, priority: f64) -> Self {
        Self {
            id: id.into(),
            priority,
            tags: Vec::new(),
            last_updated: None,
            success_rate: None,
            pattern_confidence: None,
            provenance: None,
            performance_delta: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    pub fn with_success_rate(mut self, success_rate: f64) -> Self {
        self.success_rate = Some(success_rate);
        self
    }

    pub fn with_pattern_confidence(mut self, confidence: f64) -> Self {
        self.pattern_confidence = Some(confidence);
        self
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    pub fn with_performance_delta(mut self, delta: f64) -> Self {
        self.performance_delta = Some(delta);
        self
    }

    /// Copy with unit-interval fields clamped and the delta floored at zero
    pub fn normalized(&self) -> Self {
        Self {
            priority: clamp_unit(self.priority),
            success_rate: self.success_rate.map(clamp_unit),
            pattern_confidence: self.pattern_confidence.map(clamp_unit),
            performance_delta: self
                .performance_delta
                .map(|delta| if delta.is_finite() { delta.max(0.0) } else { 0.0 }),
            ..self.clone()
        }
    }
}

/// Clamp to [0, 1], mapping NaN to 0
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A lazily materialized knowledge fragment
#[async_trait]
pub trait ContextSource: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    async fn get_content(&self) -> Result<String, SourceError>;
}

/// A source as held by the manager: the caller's handle plus a normalized
/// copy of its descriptor
#[derive(Clone)]
pub struct RegisteredSource {
    pub descriptor: Arc<SourceDescriptor>,
    pub source: Arc<dyn ContextSource>,
}

impl RegisteredSource {
    pub fn new(source: Arc<dyn ContextSource>) -> Self {
        Self {
            descriptor: Arc::new(source.descriptor().normalized()),
            source,
        }
    }
}

impl std::fmt::Debug for RegisteredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredSource")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Source with a fixed, in-memory body
#[derive(Debug, Clone)]
pub struct StaticSource {
    descriptor: SourceDescriptor,
    content: String,
}

impl StaticSource {
    pub fn new(descriptor: SourceDescriptor, content: impl Into<String>) -> Self {
        Self {
            descriptor,
            content: content.into(),
        }
    }
}

#[async_trait]
impl ContextSource for StaticSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn get_content(&self) -> Result<String, SourceError> {
        Ok(self.content.clone())
    }
}

/// Source whose body is read from disk on every fetch
#[derive(Debug, Clone)]
pub struct FileSource {
    descriptor: SourceDescriptor,
    path: PathBuf,
}

impl FileSource {
    pub fn new(descriptor: SourceDescriptor, path: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ContextSource for FileSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn get_content(&self) -> Result<String, SourceError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Source backed by an async closure
pub struct FnSource<F> {
    descriptor: SourceDescriptor,
    fetch: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> BoxFuture<'static, Result<String, SourceError>> + Send + Sync,
{
    pub fn new(descriptor: SourceDescriptor, fetch: F) -> Self {
        Self { descriptor, fetch }
    }
}

#[async_trait]
impl<F> ContextSource for FnSource<F>
where
    F: Fn() -> BoxFuture<'static, Result<String, SourceError>> + Send + Sync,
{
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn get_content(&self) -> Result<String, SourceError> {
        (self.fetch)().await
    }
}
