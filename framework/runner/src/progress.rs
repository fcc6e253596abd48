use std::cmp::min;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gale_core::prelude::DelegatedShutdownListener;
use gale_instruments::OutcomeCounters;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

use crate::config::StopCondition;
use crate::types::GaleResult;

/// Displays a progress bar while the test is running to show the user how far along it is.
///
/// Duration bounded runs show elapsed time against the planned runtime. Iteration bounded runs show
/// completed iterations against the total planned across all agents. Both show live outcome counts.
pub(crate) fn start_progress(
    stop_condition: StopCondition,
    concurrency: usize,
    counters: Arc<OutcomeCounters>,
    shutdown_listener: DelegatedShutdownListener,
) -> GaleResult<()> {
    let (pb, position): (ProgressBar, Box<dyn Fn(Instant) -> u64 + Send>) = match stop_condition {
        StopCondition::Duration(planned_runtime) => {
            let pb = ProgressBar::new(planned_runtime.as_secs());
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}] {msg}",
                )?
                .with_key("planned_runtime", {
                    let hours = planned_runtime.as_secs() / 3600;
                    let minutes = (planned_runtime.as_secs() % 3600) / 60;
                    let seconds = planned_runtime.as_secs() % 60;
                    move |_state: &ProgressState, w: &mut dyn Write| {
                        let _ = write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds);
                    }
                })
                .progress_chars("#>-"),
            );
            let planned = planned_runtime.as_secs();
            (
                pb,
                Box::new(move |start_time: Instant| min(start_time.elapsed().as_secs(), planned)),
            )
        }
        StopCondition::Iterations(iterations) => {
            let total = iterations.saturating_mul(concurrency as u64);
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} iterations [{elapsed_precise}] {msg}",
                )?
                .progress_chars("#>-"),
            );
            let counters = counters.clone();
            (
                pb,
                Box::new(move |_start_time: Instant| min(counters.iterations(), total)),
            )
        }
    };

    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                pb.set_position(position(start_time));
                pb.set_message(counters.snapshot().to_string());
                std::thread::sleep(Duration::from_secs(1));
            }
        })?;

    Ok(())
}
