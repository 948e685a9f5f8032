//! Phase timing hooks
//!
//! Components take an `Arc<dyn Observer>` and report each completed phase
//! to it. Nothing here is process-global: the binary hands out a
//! [`TracingObserver`], tests hand out whatever they want to inspect.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    KeyGen,
    LoadCorpus,
    BuildUniverse,
    Setup,
    Query,
    Execute,
    GeneratePermutation,
    LoadPermutation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::KeyGen => "key generation",
            Phase::LoadCorpus => "corpus load",
            Phase::BuildUniverse => "keyword universe",
            Phase::Setup => "setup",
            Phase::Query => "query generation",
            Phase::Execute => "query execution",
            Phase::GeneratePermutation => "permutation generation",
            Phase::LoadPermutation => "permutation load",
        };
        f.write_str(name)
    }
}

pub trait Observer: Send + Sync {
    /// Called once per completed phase. `items` is the number of things the
    /// phase produced (documents, keywords, matches, ...).
    fn record(&self, phase: Phase, elapsed: Duration, items: usize);
}

/// Emits every record as a `tracing` info event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn record(&self, phase: Phase, elapsed: Duration, items: usize) {
        tracing::info!(%phase, ?elapsed, items, "{} completed in {:.2?} ({} items)", phase, elapsed, items);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record(&self, _phase: Phase, _elapsed: Duration, _items: usize) {}
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<(Phase, Duration, usize)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Phase, Duration, usize)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.records().into_iter().map(|(phase, _, _)| phase).collect()
    }
}

impl Observer for RecordingObserver {
    fn record(&self, phase: Phase, elapsed: Duration, items: usize) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((phase, elapsed, items));
    }
}

/// Measures one phase; report it with [`PhaseTimer::finish`].
pub(crate) struct PhaseTimer<'o> {
    observer: &'o dyn Observer,
    phase: Phase,
    start: Instant,
}

impl<'o> PhaseTimer<'o> {
    pub(crate) fn start(observer: &'o dyn Observer, phase: Phase) -> Self {
        tracing::debug!(%phase, "starting");
        Self {
            observer,
            phase,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self, items: usize) {
        self.observer.record(self.phase, self.start.elapsed(), items);
    }
}

pub fn tracing_observer() -> Arc<dyn Observer> {
    Arc::new(TracingObserver)
}

pub fn noop_observer() -> Arc<dyn Observer> {
    Arc::new(NoopObserver)
}
