mod outcome_table;

use gale_summary_model::OutcomeSummary;
use tabled::settings::Style;
use tabled::Table;

use crate::report::summary_report::outcome_table::StepRow;
use crate::report::ReportCollector;

/// Prints a table of per-step outcomes at the end of the run.
#[derive(Debug, Default)]
pub struct SummaryReportCollector;

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn render(outcome: &OutcomeSummary) -> String {
        let rows = outcome
            .steps
            .iter()
            .map(|(step, summary)| StepRow {
                step: step.clone(),
                attempted: summary.attempted,
                succeeded: summary.succeeded,
                failed_transport: summary.failed_transport,
                failed_parse: summary.failed_parse,
                failed_business: summary.failed_business,
                no_usable_data: summary.no_usable_data,
                avg_time_ms: summary.mean_latency_ms(),
                min_time_ms: summary.min_latency_ms,
                max_time_ms: summary.max_latency_ms,
            })
            .collect::<Vec<_>>();

        let mut table = Table::new(rows);
        table.with(Style::modern());

        format!("Summary of {} iterations\n{}", outcome.iterations, table)
    }
}

impl ReportCollector for SummaryReportCollector {
    fn finalize(&self, outcome: &OutcomeSummary) {
        println!("\n{}", Self::render(outcome));
    }
}
