use std::{fmt::Debug, sync::Arc};

use gale_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use gale_instruments::OutcomeCounters;

use crate::{config::RunConfig, executor::Executor};

pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// The context shared by every agent in a run.
///
/// It is mutable during the global setup hook, then frozen behind an [Arc] for the rest of the run.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    counters: Arc<OutcomeCounters>,
    shutdown_handle: ShutdownHandle,
    config: Arc<RunConfig>,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        counters: Arc<OutcomeCounters>,
        shutdown_handle: ShutdownHandle,
        config: Arc<RunConfig>,
    ) -> Self {
        Self {
            executor,
            counters,
            shutdown_handle,
            config,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// The run-wide outcome counters. Clone the [Arc] to hand them to a client.
    pub fn counters(&self) -> &Arc<OutcomeCounters> {
        &self.counters
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn target_url(&self) -> &str {
        &self.config.target_url
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// Raise the shutdown signal. Agents finish the iteration they are on and then stop.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// The context for a single agent (virtual user).
///
/// Each agent has its own context, so the scenario values in it need no synchronisation.
pub struct AgentContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    agent_index: usize,
    agent_id: String,
    iteration: u64,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: DelegatedShutdownListener,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> AgentContext<RV, V> {
    pub(crate) fn new(
        agent_index: usize,
        agent_id: String,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            agent_index,
            agent_id,
            iteration: 0,
            runner_context,
            shutdown_listener,
            value: Default::default(),
        }
    }

    /// The ordinal of this agent within the run, from `0` to `concurrency - 1`.
    pub fn agent_index(&self) -> usize {
        self.agent_index
    }

    /// A readable id for this agent, `agent-<index>`.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The number of the iteration currently being run, counting from `0`.
    ///
    /// Within a run the pair of [AgentContext::agent_index] and this value is unique.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn get(&self) -> &V {
        &self.value
    }
}
