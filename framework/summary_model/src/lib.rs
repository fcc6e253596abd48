use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::BTreeMap;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

/// Aggregated outcome counts for a single step, such as the catalog fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepSummary {
    /// Number of times the step ran to an outcome.
    ///
    /// This is always the sum of the outcome categories below.
    pub attempted: u64,
    pub succeeded: u64,
    /// Non-2xx responses and requests that never got a response.
    pub failed_transport: u64,
    /// Responses whose body did not have the expected shape.
    pub failed_parse: u64,
    /// Requests the target rejected with domain errors, such as insufficient stock.
    pub failed_business: u64,
    /// Well-formed responses that carried nothing usable, such as an empty catalog.
    pub no_usable_data: u64,
    /// Sum of the step latencies, in milliseconds.
    pub total_latency_ms: f64,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
}

impl StepSummary {
    /// Every outcome that was not a success.
    pub fn failed(&self) -> u64 {
        self.failed_transport + self.failed_parse + self.failed_business + self.no_usable_data
    }

    pub fn mean_latency_ms(&self) -> Option<f64> {
        if self.attempted == 0 {
            None
        } else {
            Some(self.total_latency_ms / self.attempted as f64)
        }
    }
}

/// Outcome counters for a whole run, keyed by step name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutcomeSummary {
    /// The number of iterations that ran to completion, across all agents.
    pub iterations: u64,
    pub steps: BTreeMap<String, StepSummary>,
}

impl OutcomeSummary {
    pub fn step(&self, name: &str) -> Option<&StepSummary> {
        self.steps.get(name)
    }

    /// Counts for a step, or zeroes if the step never ran.
    pub fn step_or_default(&self, name: &str) -> StepSummary {
        self.steps.get(name).cloned().unwrap_or_default()
    }
}

impl std::fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "iterations={}", self.iterations)?;
        if !self.steps.is_empty() {
            let steps = self
                .steps
                .iter()
                .map(|(name, step)| format!("{name}={}/{}", step.succeeded, step.attempted))
                .join(" ");
            write!(f, " {steps}")?;
        }
        Ok(())
    }
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The duration that the run was configured with, in milliseconds
    ///
    /// Only set for duration bounded runs.
    pub run_duration_ms: Option<u64>,
    /// The number of iterations each agent was configured to run
    ///
    /// Only set for iteration bounded runs.
    pub iterations_per_agent: Option<u64>,
    /// Wall-clock time from the first agent starting to the last agent finishing, in milliseconds
    pub elapsed_ms: u64,
    /// The number of agents configured
    pub agent_count: usize,
    /// The number of agents that were still running at the end of the run
    ///
    /// Agents that fail their setup or bail out are not counted, so this can be less than
    /// [RunSummary::agent_count].
    pub agent_end_count: usize,
    /// The storefront channel that the run targeted
    pub channel: String,
    /// The endpoint that the run targeted
    pub target_url: String,
    /// Aggregated outcomes for the run
    pub outcome: OutcomeSummary,
    /// The version of Gale that was used for this run
    pub gale_version: String,
}

impl RunSummary {
    /// Create a new run summary
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: String,
        scenario_name: String,
        started_at: i64,
        run_duration_ms: Option<u64>,
        iterations_per_agent: Option<u64>,
        agent_count: usize,
        channel: String,
        target_url: String,
        gale_version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            started_at,
            run_duration_ms,
            iterations_per_agent,
            elapsed_ms: 0,
            agent_count,
            agent_end_count: 0,
            channel,
            target_url,
            outcome: OutcomeSummary::default(),
            gale_version,
        }
    }

    pub fn set_agent_end_count(&mut self, agent_end_count: usize) {
        self.agent_end_count = agent_end_count;
    }

    pub fn set_elapsed_ms(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = elapsed_ms;
    }

    pub fn set_outcome(&mut self, outcome: OutcomeSummary) {
        self.outcome = outcome;
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to identify the configuration used to run the scenario, so that
    /// runs with the same shape can be compared. It uses the
    ///     - Scenario name
    ///     - Run duration or iterations per agent
    ///     - Agent count
    ///     - Channel
    ///     - Gale version
    ///
    /// The target URL is left out because the same test is commonly pointed at different
    /// environments. The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        if let Some(run_duration_ms) = self.run_duration_ms {
            Digest::update(&mut hasher, b"duration");
            Digest::update(&mut hasher, run_duration_ms.to_le_bytes());
        }
        if let Some(iterations) = self.iterations_per_agent {
            Digest::update(&mut hasher, b"iterations");
            Digest::update(&mut hasher, iterations.to_le_bytes());
        }
        Digest::update(&mut hasher, self.agent_count.to_le_bytes());
        Digest::update(&mut hasher, self.channel.as_bytes());
        Digest::update(&mut hasher, self.gale_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: PathBuf) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
