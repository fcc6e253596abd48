use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use gale_core::prelude::AgentBailError;
use gale_instruments::{NoopReportCollector, OutcomeCounters, ReportCollector, SummaryReportCollector};
use gale_summary_model::{append_run_summary, RunSummary};

use crate::cli::ReporterOpt;
use crate::config::StopCondition;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::shutdown::start_shutdown_listener;
use crate::types::GaleResult;
use crate::{
    context::{AgentContext, RunnerContext, UserValuesConstraint},
    definition::ScenarioDefinitionBuilder,
    executor::Executor,
};

/// Run a scenario to completion.
///
/// One thread is started per agent. Each agent runs the behaviour hook in a loop until its stop
/// condition is met, the ceiling elapses or the run is interrupted. The stop check happens between
/// iterations, so an iteration that has started always finishes.
///
/// Returns the run summary, including the final outcome counters, once every agent has stopped.
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> GaleResult<RunSummary> {
    let definition = definition.build()?;
    let config = Arc::new(definition.config.clone());

    log::info!(
        "Running scenario: {} against {} with {} agents",
        definition.name,
        config.target_url,
        config.concurrency
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let executor = Arc::new(Executor::new(runtime));
    let counters = Arc::new(OutcomeCounters::new());
    let reporter: Box<dyn ReportCollector> = match definition.reporter {
        ReporterOpt::InMemory => Box::new(SummaryReportCollector::new()),
        ReporterOpt::Noop => Box::new(NoopReportCollector),
    };

    let mut runner_context = RunnerContext::new(
        executor,
        counters.clone(),
        shutdown_handle.clone(),
        config.clone(),
    );

    if let Some(setup_fn) = &definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    let (run_duration_ms, iterations_per_agent) = match config.stop_condition {
        StopCondition::Duration(duration) => (
            Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)),
            None,
        ),
        StopCondition::Iterations(iterations) => (None, Some(iterations)),
    };
    let mut summary = RunSummary::new(
        definition
            .run_id
            .clone()
            .unwrap_or_else(|| nanoid::nanoid!()),
        definition.name.clone(),
        chrono::Utc::now().timestamp(),
        run_duration_ms,
        iterations_per_agent,
        config.concurrency,
        config.channel.clone(),
        config.target_url.clone(),
        env!("CARGO_PKG_VERSION").to_string(),
    );

    // Raise the shutdown signal at the deadline. For duration bounded runs that is the end of the
    // run, for iteration bounded runs it is the safety ceiling.
    let deadline = config.deadline();
    let started = Instant::now();
    {
        let shutdown_handle = shutdown_handle.clone();
        let hit_ceiling = match config.stop_condition {
            StopCondition::Duration(duration) => duration > config.max_duration,
            StopCondition::Iterations(_) => true,
        };
        runner_context.executor().spawn(async move {
            tokio::time::sleep(deadline).await;
            if hit_ceiling {
                log::warn!("Run reached its maximum duration of {deadline:?}, stopping agents");
            } else {
                log::info!("Run duration of {deadline:?} elapsed, stopping agents");
            }
            shutdown_handle.shutdown();
        });
    }

    if !definition.no_progress {
        let progress_stop_condition = match config.stop_condition {
            StopCondition::Duration(_) => StopCondition::Duration(deadline),
            iterations => iterations,
        };
        start_progress(
            progress_stop_condition,
            config.concurrency,
            counters.clone(),
            shutdown_handle.new_listener(),
        )?;
    }

    let runner_context = Arc::new(runner_context);

    // Ready to start spawning agents so start the resource monitor to report high usage by agents
    // which might lead to a misleading outcome.
    start_monitor(shutdown_handle.new_listener())?;

    let mut handles = Vec::with_capacity(config.concurrency);
    for agent_index in 0..config.concurrency {
        // Read access to the runner context for each agent
        let runner_context = runner_context.clone();
        let counters = counters.clone();
        let stop_condition = config.stop_condition;

        let setup_agent_fn = definition.setup_agent_fn;
        let agent_behaviour_fn = definition.agent_behaviour;
        let teardown_agent_fn = definition.teardown_agent_fn;

        // For us to check if the agent should shut down between iterations
        let cycle_shutdown_listener = shutdown_handle.new_listener();
        // For the behaviour implementation to listen for shutdown and respond appropriately
        let delegated_shutdown_listener = shutdown_handle.new_listener();

        let agent_id = format!("agent-{}", agent_index);

        handles.push(
            std::thread::Builder::new()
                .name(agent_id.clone())
                .spawn(move || -> bool {
                    let mut context = AgentContext::new(
                        agent_index,
                        agent_id.clone(),
                        runner_context,
                        delegated_shutdown_listener,
                    );
                    if let Some(setup_agent_fn) = setup_agent_fn {
                        if let Err(e) = setup_agent_fn(&mut context) {
                            log::error!("Agent setup failed for agent {}: {:?}", agent_id, e);
                            return false;
                        }
                    }

                    let mut still_running = true;
                    if let Some(behaviour) = agent_behaviour_fn {
                        log::debug!("Starting agent {}", agent_id);
                        loop {
                            if let StopCondition::Iterations(quota) = stop_condition {
                                if context.iteration() >= quota {
                                    log::debug!("Agent {} finished its iterations", agent_id);
                                    break;
                                }
                            }

                            if cycle_shutdown_listener.should_shutdown() {
                                log::debug!("Stopping agent {}", agent_id);
                                break;
                            }

                            let result =
                                std::panic::catch_unwind(AssertUnwindSafe(|| behaviour(&mut context)));

                            // Whatever happened, this iteration is over.
                            context.advance_iteration();
                            counters.record_iteration();

                            match result {
                                Ok(Ok(())) => {}
                                Ok(Err(e)) if e.is::<AgentBailError>() => {
                                    log::warn!("Agent {} bailed: {}", agent_id, e);
                                    still_running = false;
                                    break;
                                }
                                Ok(Err(e)) => {
                                    log::error!("Agent behaviour failed for agent {}: {:?}", agent_id, e);
                                }
                                Err(panic) => {
                                    log::error!(
                                        "Agent behaviour panicked for agent {}: {}",
                                        agent_id,
                                        panic_message(panic.as_ref())
                                    );
                                }
                            }
                        }
                    }

                    if let Some(teardown_agent_fn) = teardown_agent_fn {
                        if let Err(e) = teardown_agent_fn(&mut context) {
                            log::error!("Agent teardown failed for agent {}: {:?}", agent_id, e);
                        }
                    }

                    still_running
                })
                .context("Failed to spawn thread for test agent")?,
        );
    }

    let mut agent_end_count = 0;
    for handle in handles {
        let still_running = handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining thread for test agent: {:?}", e))?;
        if still_running {
            agent_end_count += 1;
        }
    }
    let elapsed = started.elapsed();

    // Stop the deadline timer's dependants, the progress bar and the monitor.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Don't crash the runner if the teardown fails. We still want the reporting to happen
        // cleanly. The hook is documented as 'best effort'
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {:?}", e);
        }
    }

    let outcome = counters.snapshot();
    reporter.finalize(&outcome);

    summary.set_agent_end_count(agent_end_count);
    summary.set_elapsed_ms(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    summary.set_outcome(outcome);

    log::info!(
        "Run {} finished in {:?} with {}/{} agents still running: {}",
        summary.run_id,
        elapsed,
        agent_end_count,
        config.concurrency,
        summary.outcome
    );

    if let Some(summary_file) = definition.summary_file {
        append_run_summary(&summary, summary_file.clone()).with_context(|| {
            format!("Failed to write run summary to {}", summary_file.display())
        })?;
    }

    Ok(summary)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
