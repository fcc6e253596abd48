mod counters;
mod report;

use std::time::{Duration, Instant};

pub use counters::{OutcomeCounters, StepCounters};
pub use report::{NoopReportCollector, ReportCollector, SummaryReportCollector};

/// The category an operation's outcome is counted under.
///
/// Every recorded operation lands in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Succeeded,
    /// A non-2xx status, or no response at all.
    TransportFailure,
    /// The response did not have the expected shape.
    ParseFailure,
    /// The target rejected the request for a domain reason.
    BusinessFailure,
    /// The response was well-formed but had nothing usable in it.
    NoUsableData,
}

/// Tracks a single in-flight operation so that its latency can be recorded with its outcome.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    operation_id: String,
    started: Instant,
}

impl OperationRecord {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            started: Instant::now(),
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
