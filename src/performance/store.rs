//! JSON snapshot persistence for workflow baselines
//!
//! Writes are coalesced through a single pending slot: a snapshot requested
//! while another write is in flight replaces any older pending snapshot, and
//! the in-flight writer flushes it before releasing the slot. Snapshots carry
//! a generation number so an older snapshot never overwrites a newer one.

use super::models::{BaselineEntry, BaselineFile};
use crate::error::{ContextError, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Snapshot of the baseline map at a given generation
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub file: BaselineFile,
}

#[derive(Debug, Default)]
struct WriteSlot {
    writing: bool,
    pending: Option<Snapshot>,
    written: Option<u64>,
}

/// Baseline file reader/writer
#[derive(Debug)]
pub struct BaselineStore {
    path: PathBuf,
    slot: Mutex<WriteSlot>,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(WriteSlot::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load baselines; a missing file yields an empty map
    pub fn load(&self) -> Result<BTreeMap<String, BaselineEntry>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No baseline file at {}", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(ContextError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let file: BaselineFile = serde_json::from_str(&raw)?;
        debug!(
            "Loaded {} baseline(s) from {}",
            file.baselines.len(),
            self.path.display()
        );
        Ok(file.baselines)
    }

    /// Persist a snapshot, coalescing with any write already in flight.
    ///
    /// Failures are logged, never returned: recording a sample must not fail
    /// because the disk did.
    pub fn persist(&self, snapshot: Snapshot) {
        let mut next = {
            let mut slot = self.lock();
            if slot.writing {
                let newer = slot
                    .pending
                    .as_ref()
                    .map_or(true, |pending| pending.generation < snapshot.generation);
                if newer {
                    debug!("Baseline write in flight, queued generation {}", snapshot.generation);
                    slot.pending = Some(snapshot);
                }
                return;
            }
            slot.writing = true;
            Some(snapshot)
        };

        while let Some(snapshot) = next.take() {
            let stale = self
                .lock()
                .written
                .is_some_and(|written| written >= snapshot.generation);

            if stale {
                debug!("Skipping stale baseline snapshot {}", snapshot.generation);
            } else {
                match self.write(&snapshot.file) {
                    Ok(()) => self.lock().written = Some(snapshot.generation),
                    Err(err) => warn!("Failed to persist baselines: {}", err),
                }
            }

            let mut slot = self.lock();
            next = slot.pending.take();
            if next.is_none() {
                slot.writing = false;
            }
        }
    }

    fn write(&self, file: &BaselineFile) -> Result<()> {
        let io_err = |source| ContextError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(file)?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, body).map_err(io_err)?;
        std::fs::rename(&staging, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WriteSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
