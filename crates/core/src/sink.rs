//! Reporting of items skipped during best-effort enumeration.
//!
//! Walking the vault and scanning index rows never fail as a whole because of
//! a single bad entry. The offending entry is handed to an [`ErrorSink`] and
//! skipped. [`TracingSink`] logs it, [`MemorySink`] keeps it around so callers
//! (and tests) can inspect what was dropped.

use std::error::Error;
use std::sync::{Arc, Mutex};

/// Receives entries skipped because of a recoverable error.
pub trait ErrorSink {
    /// `context` names the skipped item (a path, a row identifier...).
    fn skipped(&self, context: &str, error: &dyn Error);
}

/// Default sink: logs a warning through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn skipped(&self, context: &str, error: &dyn Error) {
        tracing::warn!("skipping {}: {}", context, error);
    }
}

/// A skipped entry recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub context: String,
    pub message: String,
}

/// Sink collecting skipped entries in memory.
///
/// Clones share the same storage, so a clone can be handed to an
/// [`IndexDb`](crate::index::IndexDb) while the original is kept for
/// inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<SkippedEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries recorded so far.
    pub fn entries(&self) -> Vec<SkippedEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl ErrorSink for MemorySink {
    fn skipped(&self, context: &str, error: &dyn Error) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(SkippedEntry {
                context: context.to_string(),
                message: error.to_string(),
            });
        }
    }
}
