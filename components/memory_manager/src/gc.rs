//! Tracing collector and collection pacing.
//!
//! Reference counting frees most garbage the moment it becomes unreachable.
//! What it cannot free are cycles; the tracer here marks everything reachable
//! from the roots and the heap frees the rest. The tracer is a pure function
//! of (heap, roots) and never mutates the heap.

use std::collections::HashSet;

use log::{debug, info};

use crate::allocator::ObjectId;
use crate::heap::{Heap, ObjectPtr};

/// Default number of instructions between collection checks.
pub const DEFAULT_COUNTDOWN: u64 = 65536;

/// Default live-object count below which no trace is run.
pub const DEFAULT_LIMIT: usize = 8192;

/// Marks every object reachable from `roots`.
///
/// Edges are slot values plus whatever a continuation primitive references.
/// Stale roots are ignored.
pub fn trace<'a, I>(heap: &Heap, roots: I) -> HashSet<ObjectId>
where
    I: IntoIterator<Item = &'a ObjectPtr>,
{
    let mut reached = HashSet::new();
    let mut worklist: Vec<ObjectId> = roots
        .into_iter()
        .map(ObjectPtr::id)
        .filter(|&id| heap.is_live(id))
        .collect();
    while let Some(id) = worklist.pop() {
        if !reached.insert(id) {
            continue;
        }
        worklist.extend(
            heap.edges(id)
                .into_iter()
                .filter(|e| !reached.contains(e) && heap.is_live(*e)),
        );
    }
    reached
}

/// Traces from `roots` and frees everything unreached. Returns the number
/// of objects freed.
pub fn collect<'a, I>(heap: &Heap, roots: I) -> usize
where
    I: IntoIterator<Item = &'a ObjectPtr>,
{
    let reached = trace(heap, roots);
    heap.sweep(&reached)
}

/// Decides when to run the tracer.
///
/// Every instruction calls [`Collector::tick`]. When the countdown expires
/// and the heap is over the soft limit a trace is due; afterwards
/// [`Collector::record`] resets the countdown and doubles the limit if the
/// heap is still over it.
#[derive(Debug, Clone)]
pub struct Collector {
    period: u64,
    countdown: u64,
    limit: usize,
    tracing: bool,
    runs: u64,
    total_freed: u64,
}

impl Collector {
    /// A collector with the default countdown and limit.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_COUNTDOWN, DEFAULT_LIMIT)
    }

    /// A collector with explicit settings.
    pub fn with_settings(period: u64, limit: usize) -> Self {
        let period = period.max(1);
        Collector {
            period,
            countdown: period,
            limit,
            tracing: false,
            runs: 0,
            total_freed: 0,
        }
    }

    /// Counts one instruction. Returns `true` when a trace should run now.
    ///
    /// `live` is only called once the countdown has expired. An expired
    /// countdown stays at zero, so the limit is checked on every instruction
    /// until a trace runs and [`Collector::record`] rearms it.
    pub fn tick(&mut self, live: impl FnOnce() -> usize) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return false;
        }
        live() > self.limit
    }

    /// Records a completed trace.
    pub fn record(&mut self, freed: usize, live_after: usize) {
        self.runs += 1;
        self.total_freed += freed as u64;
        self.countdown = self.period;
        if self.tracing {
            info!(
                "gc run {}: freed {} object(s), {} live, limit {}",
                self.runs, freed, live_after, self.limit
            );
        } else {
            debug!(
                "gc run {}: freed {} object(s), {} live",
                self.runs, freed, live_after
            );
        }
        if live_after > self.limit {
            self.limit = self.limit.saturating_mul(2);
            if self.tracing {
                info!("gc limit raised to {}", self.limit);
            }
        }
    }

    /// The current soft limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Instructions left before the next check.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Completed traces.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Objects freed by all traces so far.
    pub fn total_freed(&self) -> u64 {
        self.total_freed
    }

    /// Turns collector logging at `info` level on or off.
    pub fn set_tracing(&mut self, on: bool) {
        self.tracing = on;
    }

    /// Returns `true` when collector logging is on.
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}
