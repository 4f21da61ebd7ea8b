//! # Price Audit Log
//!
//! Bounded, in-memory trail of price calculation snapshots.
//!
//! ## Thread Safety
//! The entries sit behind a `Mutex` so append-then-evict is one atomic step
//! and the bound holds even if a host calls in from several threads.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Audit Log (capacity 10)                              │
//! │                                                                         │
//! │  log_entry(#11) ──► [#2 #3 #4 #5 #6 #7 #8 #9 #10 #11]  ─► #1 evicted    │
//! │                      oldest ◄─────────────────► newest                  │
//! │                                                                         │
//! │  entries()        copy out, in insertion order                          │
//! │  export_as_text() paste into a bug report                               │
//! │  clear()          between booking sessions                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trail is diagnostic only. Nothing reads it to make a pricing
//! decision, and it is not persisted.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::types::PriceAuditEntry;

/// Number of snapshots kept unless configured otherwise.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10;

/// Append-only log holding the most recent `capacity` snapshots.
///
/// Owned by the caller, typically one per booking session.
#[derive(Debug)]
pub struct AuditLogger {
    capacity: usize,
    entries: Mutex<VecDeque<PriceAuditEntry>>,
}

impl AuditLogger {
    /// Creates an empty log. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        AuditLogger {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a snapshot, evicting the oldest ones past capacity.
    pub fn log_entry(&self, entry: PriceAuditEntry) {
        debug!(
            step = %entry.step,
            total = entry.calculated_total.amount(),
            "Price audit entry recorded"
        );
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Copy of the current trail, oldest first.
    pub fn entries(&self) -> Vec<PriceAuditEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Most recent snapshot, if any.
    pub fn latest(&self) -> Option<PriceAuditEntry> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Human-readable dump of the trail.
    ///
    /// ```text
    /// === Price audit trail (1 entries) ===
    /// [1] 2026-10-19T08:30:00+00:00 step=addons
    ///     selection=1,256,000 baggage=260,000 services=250,000 addons=510,000
    ///     total=1,766,000 VND passengers=1 trip=one_way
    /// ```
    pub fn export_as_text(&self) -> String {
        let entries = self.lock();
        let mut out = String::new();
        let _ = writeln!(out, "=== Price audit trail ({} entries) ===", entries.len());
        for (i, e) in entries.iter().enumerate() {
            let _ = writeln!(out, "[{}] {} step={}", i + 1, e.timestamp.to_rfc3339(), e.step);
            let _ = writeln!(
                out,
                "    selection={} baggage={} services={} addons={}",
                e.selection_price, e.baggage_total, e.services_total, e.addons_total
            );
            let _ = writeln!(
                out,
                "    total={} {} passengers={} trip={}",
                e.calculated_total, e.currency, e.passenger_count, e.trip_type
            );
            if let Some(details) = e.details.as_ref().filter(|d| !d.is_empty()) {
                let joined: Vec<String> = details.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                let _ = writeln!(out, "    details: {}", joined.join(", "));
            }
        }
        out
    }

    /// The trail as a pretty-printed JSON array.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let entries = self.entries();
        serde_json::to_string_pretty(&entries)
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<PriceAuditEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        AuditLogger::new(DEFAULT_AUDIT_CAPACITY)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
