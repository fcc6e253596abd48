use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;

use crate::cli::{GaleScenarioCli, ReporterOpt};
use crate::config::{RunConfig, StopCondition};
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
use crate::types::GaleResult;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut AgentContext<RV, V>) -> HookResult;

const DEFAULT_CONCURRENCY: usize = 1;

enum ConfigSource {
    Cli(Box<GaleScenarioCli>),
    Config(RunConfig),
}

/// The builder for a scenario definition.
///
/// This must be used at the start of a test to define the scenario that you want to run.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario, which should be unique within the test suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// Where the run configuration comes from. Usually the command line.
    config_source: ConfigSource,
    /// Used when the CLI does not set a concurrency.
    default_concurrency: Option<usize>,
    /// Used when the CLI sets neither `--iterations` nor `--duration`.
    default_stop_condition: Option<StopCondition>,
    /// Global setup hook for this scenario. It will be run once, before any agents are started.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook for an agent, which will be run once for each agent as it starts.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// The agent behaviour for this scenario. One call is one iteration.
    agent_behaviour: Option<AgentHookMut<RV, V>>,
    /// Teardown hook for an agent, which will be run once for each agent after it stops.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Global teardown hook, run once after every agent has stopped.
    ///
    /// This is best effort. An error here is logged but does not fail the run.
    teardown_fn: Option<GlobalHook<RV>>,
}

pub struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub name: String,
    pub config: RunConfig,
    pub no_progress: bool,
    pub reporter: ReporterOpt,
    pub run_id: Option<String>,
    pub summary_file: Option<PathBuf>,
    pub setup_fn: Option<GlobalHookMut<RV>>,
    pub setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub agent_behaviour: Option<AgentHookMut<RV, V>>,
    pub teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Initialise a new scenario definition from the scenario name and command line arguments.
    /// See the [ScenarioDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str, cli: GaleScenarioCli) -> Self {
        Self::with_source(name, ConfigSource::Cli(Box::new(cli)))
    }

    /// Initialise logging, parse the command line and create a new scenario definition.
    pub fn new_with_init(name: &str) -> Self {
        env_logger::init();

        Self::new(name, GaleScenarioCli::parse())
    }

    /// Create a scenario definition from a ready-made [RunConfig], bypassing the command line.
    ///
    /// Runs defined this way show no progress bar and print no report. The outcome is available
    /// from the [gale_summary_model::RunSummary] returned by [crate::run::run].
    pub fn from_config(name: &str, config: RunConfig) -> Self {
        Self::with_source(name, ConfigSource::Config(config))
    }

    fn with_source(name: &str, config_source: ConfigSource) -> Self {
        Self {
            name: name.to_string(),
            config_source,
            default_concurrency: None,
            default_stop_condition: None,
            setup_fn: None,
            setup_agent_fn: None,
            agent_behaviour: None,
            teardown_agent_fn: None,
            teardown_fn: None,
        }
    }

    /// Set the number of agents to run if none is given on the command line.
    pub fn with_default_concurrency(mut self, concurrency: usize) -> Self {
        self.default_concurrency = Some(concurrency);
        self
    }

    /// Run each agent for this many iterations unless the command line says otherwise.
    pub fn with_default_iterations(mut self, iterations: u64) -> Self {
        self.default_stop_condition = Some(StopCondition::Iterations(iterations));
        self
    }

    /// Run for this many seconds unless the command line says otherwise.
    pub fn with_default_duration_s(mut self, duration: u64) -> Self {
        self.default_stop_condition = Some(StopCondition::Duration(Duration::from_secs(duration)));
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this scenario.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Set the agent setup hook [ScenarioDefinitionBuilder::setup_agent_fn] for this scenario.
    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    /// Set the agent behaviour hook [ScenarioDefinitionBuilder::agent_behaviour] for this scenario.
    pub fn use_agent_behaviour(mut self, behaviour: AgentHookMut<RV, V>) -> Self {
        self.agent_behaviour = Some(behaviour);
        self
    }

    /// Set the agent teardown hook [ScenarioDefinitionBuilder::teardown_agent_fn] for this scenario.
    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn] for this scenario.
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> GaleResult<ScenarioDefinition<RV, V>> {
        let (config, no_progress, reporter, run_id, summary_file) = match self.config_source {
            ConfigSource::Cli(cli) => {
                let stop_condition = match (cli.iterations, cli.duration) {
                    (Some(iterations), _) => StopCondition::Iterations(iterations),
                    (None, Some(duration)) => StopCondition::Duration(Duration::from_secs(duration)),
                    (None, None) => match self.default_stop_condition {
                        Some(stop_condition) => stop_condition,
                        None => bail!("No stop condition set, pass --iterations or --duration"),
                    },
                };

                let mut config = RunConfig::new(
                    cli.target_url,
                    cli.channel,
                    cli.concurrency
                        .or(self.default_concurrency)
                        .unwrap_or(DEFAULT_CONCURRENCY),
                    stop_condition,
                )
                .with_max_duration(Duration::from_secs(cli.max_duration))
                .with_think_time(Duration::from_millis(cli.think_time_ms))
                .with_request_timeout(Duration::from_secs(cli.request_timeout));
                config.seed = cli.seed;

                (config, cli.no_progress, cli.reporter, cli.run_id, cli.summary_file)
            }
            ConfigSource::Config(config) => (config, true, ReporterOpt::Noop, None, None),
        };

        config.validate()?;

        if self.agent_behaviour.is_none() {
            log::warn!(
                "Scenario [{}] has no agent behaviour, agents will only run setup and teardown",
                self.name
            );
        }

        Ok(ScenarioDefinition {
            name: self.name,
            config,
            no_progress,
            reporter,
            run_id,
            summary_file,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            agent_behaviour: self.agent_behaviour,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Values;

    impl UserValuesConstraint for Values {}

    fn cli() -> GaleScenarioCli {
        GaleScenarioCli {
            target_url: "http://localhost:8000/graphql/".to_string(),
            channel: "default-channel".to_string(),
            concurrency: None,
            iterations: None,
            duration: None,
            max_duration: 60,
            think_time_ms: 0,
            request_timeout: 5,
            seed: None,
            no_progress: true,
            reporter: ReporterOpt::Noop,
            run_id: None,
            summary_file: None,
        }
    }

    #[test]
    fn cli_overrides_defaults() {
        let mut cli = cli();
        cli.concurrency = Some(3);
        cli.duration = Some(10);

        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("test", cli)
            .with_default_concurrency(1000)
            .with_default_iterations(5)
            .build()
            .unwrap();

        assert_eq!(3, definition.config.concurrency);
        assert_eq!(
            StopCondition::Duration(Duration::from_secs(10)),
            definition.config.stop_condition
        );
        assert_eq!(Duration::from_secs(60), definition.config.max_duration);
        assert_eq!(Duration::ZERO, definition.config.think_time);
    }

    #[test]
    fn defaults_apply_when_cli_is_silent() {
        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("test", cli())
            .with_default_concurrency(1000)
            .with_default_iterations(5)
            .build()
            .unwrap();

        assert_eq!(1000, definition.config.concurrency);
        assert_eq!(StopCondition::Iterations(5), definition.config.stop_condition);
    }

    #[test]
    fn missing_stop_condition_is_an_error() {
        let result = ScenarioDefinitionBuilder::<Values, Values>::new("test", cli()).build();
        assert!(result.is_err());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut cli = cli();
        cli.iterations = Some(0);
        let result = ScenarioDefinitionBuilder::<Values, Values>::new("test", cli).build();
        assert!(result.is_err());
    }

    #[test]
    fn config_source_is_quiet() {
        let config = RunConfig::new(
            "http://localhost:8000/graphql/",
            "default-channel",
            2,
            StopCondition::Iterations(1),
        );
        let definition = ScenarioDefinitionBuilder::<Values, Values>::from_config("test", config)
            .build()
            .unwrap();

        assert!(definition.no_progress);
        assert_eq!(ReporterOpt::Noop, definition.reporter);
    }
}
