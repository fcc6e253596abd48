use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gale_summary_model::{OutcomeSummary, StepSummary};
use parking_lot::RwLock;

use crate::{OperationRecord, OutcomeKind};

/// Lock-free outcome counts for one step.
///
/// Counts are only ever incremented. Reads taken while a run is in progress are a best effort
/// view; once every agent has stopped they are exact.
#[derive(Debug)]
pub struct StepCounters {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed_transport: AtomicU64,
    failed_parse: AtomicU64,
    failed_business: AtomicU64,
    no_usable_data: AtomicU64,
    total_latency_micros: AtomicU64,
    min_latency_micros: AtomicU64,
    max_latency_micros: AtomicU64,
}

impl Default for StepCounters {
    fn default() -> Self {
        Self {
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed_transport: AtomicU64::new(0),
            failed_parse: AtomicU64::new(0),
            failed_business: AtomicU64::new(0),
            no_usable_data: AtomicU64::new(0),
            total_latency_micros: AtomicU64::new(0),
            min_latency_micros: AtomicU64::new(u64::MAX),
            max_latency_micros: AtomicU64::new(0),
        }
    }
}

impl StepCounters {
    /// Count one outcome. Increments `attempted` and exactly one outcome category.
    pub fn record(&self, kind: OutcomeKind, latency: Duration) {
        let category = match kind {
            OutcomeKind::Succeeded => &self.succeeded,
            OutcomeKind::TransportFailure => &self.failed_transport,
            OutcomeKind::ParseFailure => &self.failed_parse,
            OutcomeKind::BusinessFailure => &self.failed_business,
            OutcomeKind::NoUsableData => &self.no_usable_data,
        };
        category.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);

        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_micros.fetch_add(micros, Ordering::Relaxed);
        self.min_latency_micros.fetch_min(micros, Ordering::Relaxed);
        self.max_latency_micros.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StepSummary {
        let attempted = self.attempted.load(Ordering::Relaxed);
        // The minimum stays at its sentinel until the first latency lands.
        let (min_latency_ms, max_latency_ms) =
            match self.min_latency_micros.load(Ordering::Relaxed) {
                u64::MAX => (None, None),
                min => (
                    Some(micros_to_ms(min)),
                    Some(micros_to_ms(self.max_latency_micros.load(Ordering::Relaxed))),
                ),
            };

        StepSummary {
            attempted,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed_transport: self.failed_transport.load(Ordering::Relaxed),
            failed_parse: self.failed_parse.load(Ordering::Relaxed),
            failed_business: self.failed_business.load(Ordering::Relaxed),
            no_usable_data: self.no_usable_data.load(Ordering::Relaxed),
            total_latency_ms: micros_to_ms(self.total_latency_micros.load(Ordering::Relaxed)),
            min_latency_ms,
            max_latency_ms,
        }
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

/// Run-wide outcome counters, shared by every agent.
///
/// Steps are created on first use. After that, recording an outcome only takes a read lock on the
/// step map and then works on atomics.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    iterations: AtomicU64,
    steps: RwLock<BTreeMap<String, Arc<StepCounters>>>,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the counters for a step, creating them if this is the first time the step is seen.
    pub fn step(&self, operation_id: &str) -> Arc<StepCounters> {
        if let Some(step) = self.steps.read().get(operation_id) {
            return step.clone();
        }

        self.steps
            .write()
            .entry(operation_id.to_string())
            .or_default()
            .clone()
    }

    /// Record the outcome of a finished operation against its step.
    pub fn record(&self, operation_record: &OperationRecord, kind: OutcomeKind) {
        let elapsed = operation_record.elapsed();
        log::trace!(
            "Operation {} finished with {:?} after {:?}",
            operation_record.operation_id(),
            kind,
            elapsed
        );
        self.step(operation_record.operation_id())
            .record(kind, elapsed);
    }

    /// Count one finished iteration, whichever path it took.
    pub fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> OutcomeSummary {
        OutcomeSummary {
            iterations: self.iterations(),
            steps: self
                .steps
                .read()
                .iter()
                .map(|(name, step)| (name.clone(), step.snapshot()))
                .collect(),
        }
    }
}
