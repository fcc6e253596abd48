use std::future::Future;

use crate::types::GaleResult;

/// Runs the async parts of agent hooks on a runtime shared by every agent.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
}

impl Executor {
    pub(crate) fn new(runtime: tokio::runtime::Runtime) -> Self {
        Self { runtime }
    }

    /// Run async code in place, blocking the calling agent until it completes.
    ///
    /// The future is never cancelled by the shutdown signal. Agents only check for shutdown between
    /// iterations, so an iteration that has started always runs to the end. Bound slow work with
    /// timeouts inside the future instead.
    pub fn execute_in_place<T>(&self, fut: impl Future<Output = GaleResult<T>>) -> GaleResult<T> {
        self.runtime.block_on(fut)
    }

    /// Submit async code to be run in the background.
    ///
    /// It is not guaranteed that the runner will wait for the future to complete before shutting
    /// down. In agent behaviour hooks, use [Executor::execute_in_place] so that the work belongs to
    /// the iteration.
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.runtime.spawn(fut);
    }
}
