mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod monitor;
mod progress;
mod run;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cli::{GaleScenarioCli, ReporterOpt};
    pub use crate::config::{RunConfig, StopCondition};
    pub use crate::context::UserValuesConstraint;
    pub use crate::context::{AgentContext, RunnerContext};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::run::run;
    pub use crate::types::GaleResult;

    pub use gale_core::prelude::{AgentBailError, DelegatedShutdownListener};
    pub use gale_instruments::{OperationRecord, OutcomeCounters, OutcomeKind};
    pub use gale_summary_model::{OutcomeSummary, RunSummary, StepSummary};
}
