use std::time::Duration;

use anyhow::{bail, Context};

use crate::types::GaleResult;

/// Decides when a virtual user stops starting new iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Each virtual user runs exactly this many iterations.
    Iterations(u64),
    /// Virtual users run iterations back to back until this much time has passed.
    Duration(Duration),
}

/// Everything a run needs to know up front. Shared read-only by every agent once the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// The number of virtual users.
    pub concurrency: usize,
    pub stop_condition: StopCondition,
    /// The GraphQL endpoint under test.
    pub target_url: String,
    pub channel: String,
    /// Safety ceiling for the whole run, regardless of the stop condition.
    pub max_duration: Duration,
    /// Pacing delay at the end of each iteration.
    pub think_time: Duration,
    pub request_timeout: Duration,
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(
        target_url: impl Into<String>,
        channel: impl Into<String>,
        concurrency: usize,
        stop_condition: StopCondition,
    ) -> Self {
        Self {
            concurrency,
            stop_condition,
            target_url: target_url.into(),
            channel: channel.into(),
            max_duration: Duration::from_secs(4 * 60 * 60),
            think_time: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
            seed: None,
        }
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// How long after the start of the run the shutdown signal is raised.
    ///
    /// For duration bounded runs this is the configured duration, capped by the ceiling. For
    /// iteration bounded runs it is just the ceiling.
    pub fn deadline(&self) -> Duration {
        match self.stop_condition {
            StopCondition::Duration(duration) => duration.min(self.max_duration),
            StopCondition::Iterations(_) => self.max_duration,
        }
    }

    pub fn validate(&self) -> GaleResult<()> {
        if self.concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }

        match self.stop_condition {
            StopCondition::Iterations(0) => bail!("Iterations per agent must be at least 1"),
            StopCondition::Duration(duration) if duration.is_zero() => {
                bail!("Run duration must be greater than zero")
            }
            _ => {}
        }

        if self.max_duration.is_zero() {
            bail!("Maximum run duration must be greater than zero");
        }

        if self.channel.trim().is_empty() {
            bail!("Channel must not be empty");
        }

        let url = url::Url::parse(&self.target_url)
            .with_context(|| format!("Invalid target URL '{}'", self.target_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Target URL must use http or https, got '{}'", url.scheme());
        }

        Ok(())
    }
}
