//! Change metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::extension::ApplyOutcome;

/// Counters for change activity
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Applies that computed snapshots
    changes_applied: AtomicU64,
    /// Applies served from cached snapshots
    changes_replayed: AtomicU64,
    /// Reverts
    changes_reverted: AtomicU64,
    /// Cell indices handed out for new columns
    cell_indices_minted: AtomicU64,
    /// Continuation rows that received overflow values
    filler_rows_reused: AtomicU64,
    /// Rows created to hold overflow values
    rows_synthesized: AtomicU64,
    /// Change records written
    records_encoded: AtomicU64,
    /// Change records read
    records_decoded: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the result of one `apply` into the counters
    pub fn record_apply(&self, outcome: &ApplyOutcome) {
        if outcome.replayed {
            self.changes_replayed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.changes_applied.fetch_add(1, Ordering::Relaxed);
        }
        self.cell_indices_minted
            .fetch_add(outcome.cell_indices_minted as u64, Ordering::Relaxed);
        self.filler_rows_reused
            .fetch_add(outcome.filler_rows_reused as u64, Ordering::Relaxed);
        self.rows_synthesized
            .fetch_add(outcome.rows_synthesized as u64, Ordering::Relaxed);
    }

    pub fn increment_reverted(&self) {
        self.changes_reverted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_encoded(&self, count: u64) {
        self.records_encoded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_decoded(&self, count: u64) {
        self.records_decoded.fetch_add(count, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            changes_applied: self.changes_applied.load(Ordering::Relaxed),
            changes_replayed: self.changes_replayed.load(Ordering::Relaxed),
            changes_reverted: self.changes_reverted.load(Ordering::Relaxed),
            cell_indices_minted: self.cell_indices_minted.load(Ordering::Relaxed),
            filler_rows_reused: self.filler_rows_reused.load(Ordering::Relaxed),
            rows_synthesized: self.rows_synthesized.load(Ordering::Relaxed),
            records_encoded: self.records_encoded.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
        }
    }

    /// Current values as one JSON object
    pub fn to_json(&self) -> String {
        // Plain integers and fixed keys; serialization cannot fail
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub changes_applied: u64,
    pub changes_replayed: u64,
    pub changes_reverted: u64,
    pub cell_indices_minted: u64,
    pub filler_rows_reused: u64,
    pub rows_synthesized: u64,
    pub records_encoded: u64,
    pub records_decoded: u64,
}
