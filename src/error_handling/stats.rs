//! Gate statistics tracking.
//!
//! Thread-safe counters for request outcomes and database refreshes, shared
//! between request tasks, the refresh task and the status server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;
use strum_macros::{EnumIter as EnumIterMacro, IntoStaticStr};

/// Events counted by [`GateStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// Request passed to the next stage
    Forwarded,
    /// Denied because of the country policy
    DeniedPolicy,
    /// Denied because no client IP could be resolved
    DeniedIpUnresolvable,
    /// Denied because the database could not classify the IP
    DeniedLookupFailed,
    /// Denied connection dropped without a response
    ClosedRaw,
    /// Denied connection answered with 403 (no hijack capability)
    ClosedForbidden,
    /// Database reload succeeded
    RefreshSuccess,
    /// Database reload failed, previous database kept
    RefreshFailure,
}

impl Outcome {
    /// Stable snake_case name, used as a metric suffix and JSON key.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Thread-safe gate statistics.
///
/// Every [`Outcome`] is initialised to zero on creation, so counters can be
/// read and incremented concurrently through a shared reference.
pub struct GateStats {
    counters: HashMap<Outcome, AtomicUsize>,
}

impl GateStats {
    /// All counters at zero.
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for outcome in Outcome::iter() {
            counters.insert(outcome, AtomicUsize::new(0));
        }
        GateStats { counters }
    }

    /// Increment the counter for an outcome.
    pub fn increment(&self, outcome: Outcome) {
        if let Some(counter) = self.counters.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in GateStats initialization.",
                outcome
            );
        }
    }

    /// Current count for an outcome.
    pub fn get(&self, outcome: Outcome) -> usize {
        self.counters
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total requests that were denied, for any reason.
    pub fn total_denied(&self) -> usize {
        self.get(Outcome::DeniedPolicy)
            + self.get(Outcome::DeniedIpUnresolvable)
            + self.get(Outcome::DeniedLookupFailed)
    }

    /// Total requests evaluated.
    pub fn total_requests(&self) -> usize {
        self.get(Outcome::Forwarded) + self.total_denied()
    }

    /// Snapshot of all counters in declaration order.
    pub fn snapshot(&self) -> Vec<(Outcome, usize)> {
        Outcome::iter().map(|o| (o, self.get(o))).collect()
    }
}

impl Default for GateStats {
    fn default() -> Self {
        Self::new()
    }
}
