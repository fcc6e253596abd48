use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct GaleScenarioCli {
    /// The GraphQL endpoint of the commerce API to put under load
    #[clap(short, long, env = "GALE_TARGET_URL")]
    pub target_url: String,

    /// The storefront channel that catalog queries and checkouts are scoped to
    #[clap(long, default_value = "default-channel")]
    pub channel: String,

    /// The number of virtual users to run concurrently
    #[clap(short, long)]
    pub concurrency: Option<usize>,

    /// The number of iterations each virtual user runs before stopping.
    ///
    /// Cannot be combined with `--duration`. If neither is given, the scenario's default stop
    /// condition is used.
    #[clap(long, conflicts_with = "duration")]
    pub iterations: Option<u64>,

    /// The number of seconds to run the scenario for
    #[clap(long)]
    pub duration: Option<u64>,

    /// Hard ceiling on the length of the run, in seconds.
    ///
    /// No new iterations start once this has elapsed, whatever the stop condition says. Iterations
    /// that are already running are allowed to finish.
    #[clap(long, default_value_t = 4 * 60 * 60)]
    pub max_duration: u64,

    /// Pause at the end of every iteration, in milliseconds
    #[clap(long, default_value_t = 1000)]
    pub think_time_ms: u64,

    /// Timeout for a single request, in seconds
    #[clap(long, default_value_t = 60)]
    pub request_timeout: u64,

    /// Seed for the random choices made by virtual users, to make runs repeatable
    #[clap(long)]
    pub seed: Option<u64>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// The reporter to use.
    #[arg(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,

    /// Set the ID of this run
    ///
    /// If not set, a random ID is used.
    #[arg(long, short)]
    pub run_id: Option<String>,

    /// Append the run summary to this file as a line of JSON
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReporterOpt {
    /// Print a table of outcomes when the run finishes.
    InMemory,
    /// Report nothing.
    Noop,
}
