mod summary_report;

use gale_summary_model::OutcomeSummary;

pub use summary_report::SummaryReportCollector;

/// Receives the final outcome of a run so that it can be rendered or shipped somewhere.
pub trait ReportCollector: Send + Sync {
    fn finalize(&self, outcome: &OutcomeSummary);
}

/// Drops the report. Useful for tests and for runs that only care about the summary file.
#[derive(Debug, Default)]
pub struct NoopReportCollector;

impl ReportCollector for NoopReportCollector {
    fn finalize(&self, _outcome: &OutcomeSummary) {
        // no-op
    }
}
