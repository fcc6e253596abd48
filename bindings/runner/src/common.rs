use std::time::Duration;

use commerce_client_instrumented::prelude::{CommerceClient, StepFailure, TransportFault};
use gale_runner::prelude::{AgentContext, HookResult, RunnerContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::context::CommerceAgentContext;
use crate::runner_context::CommerceRunnerContext;

/// How one pass through the checkout flow ended.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    CheckoutCreated(String),
    /// A variant was chosen but the checkout was not created.
    CheckoutFailed(StepFailure),
    /// No variant could be chosen so no checkout was attempted.
    CatalogUnavailable(StepFailure),
}

/// Creates the storefront client shared by all agents and stores it in [CommerceRunnerContext].
///
/// Use this as the scenario setup hook:
/// ```rust
/// use commerce_gale_runner::prelude::*;
///
/// fn build() -> ScenarioDefinitionBuilder<CommerceRunnerContext, CommerceAgentContext> {
///     ScenarioDefinitionBuilder::new_with_init("guest_checkout").use_setup(configure_commerce_client)
/// }
/// ```
///
/// Method:
/// - Reads the target URL and request timeout from the run configuration.
/// - Builds a pooled HTTP client which records outcomes into the run's counters.
/// - Sets the `client` value in [CommerceRunnerContext].
pub fn configure_commerce_client(ctx: &mut RunnerContext<CommerceRunnerContext>) -> HookResult {
    let client = CommerceClient::connect(
        ctx.target_url(),
        ctx.config().request_timeout,
        ctx.counters().clone(),
    )?;
    log::debug!("Configured storefront client for {}", ctx.target_url());

    ctx.get_mut().client = Some(client);

    Ok(())
}

/// Seeds the agent's random source so that product choices can be replayed.
///
/// With a run seed configured each agent gets `seed ^ agent_index`, otherwise it is seeded from
/// entropy.
pub fn seed_agent_rng(
    ctx: &mut AgentContext<CommerceRunnerContext, CommerceAgentContext>,
) -> HookResult {
    let rng = match ctx.runner_context().config().seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ ctx.agent_index() as u64),
        None => StdRng::from_entropy(),
    };
    ctx.get_mut().rng = Some(rng);

    Ok(())
}

/// The guest identity for an agent's iteration. Distinct for every `(agent_index, iteration)`.
pub fn guest_email(agent_index: usize, iteration: u64) -> String {
    format!("guest_{}_{}@example.com", agent_index, iteration)
}

/// Run one pass of the guest checkout flow.
///
/// Fetches the catalog and picks a variant, then creates a checkout for it. A failed catalog step
/// means no checkout is attempted. Failures are logged here and counted by the client, so the
/// outcome is only informational. Always sleeps for `think_time` before returning.
pub async fn checkout_iteration<R: Rng + ?Sized>(
    client: &CommerceClient,
    channel: &str,
    guest_email: &str,
    think_time: Duration,
    rng: &mut R,
) -> IterationOutcome {
    let outcome = match client.fetch_catalog(channel, rng).await {
        Ok(selection) => {
            match client
                .create_checkout(channel, &selection.variant_id, guest_email)
                .await
            {
                Ok(checkout_id) => {
                    log::trace!("Created checkout {} for {}", checkout_id, guest_email);
                    IterationOutcome::CheckoutCreated(checkout_id)
                }
                Err(failure) => {
                    log_failure("Checkout", guest_email, &failure);
                    IterationOutcome::CheckoutFailed(failure)
                }
            }
        }
        Err(failure) => {
            log_failure("Catalog", guest_email, &failure);
            IterationOutcome::CatalogUnavailable(failure)
        }
    };

    tokio::time::sleep(think_time).await;

    outcome
}

/// Agent behaviour that runs [checkout_iteration] once per call.
///
/// Requires:
/// - [configure_commerce_client] to have run in the scenario setup.
pub fn guest_checkout_behaviour(
    ctx: &mut AgentContext<CommerceRunnerContext, CommerceAgentContext>,
) -> HookResult {
    let runner_context = ctx.runner_context().clone();
    let client = runner_context.get().client()?;
    let guest_email = guest_email(ctx.agent_index(), ctx.iteration());
    let rng = ctx.get_mut().rng();

    runner_context.executor().execute_in_place(async {
        checkout_iteration(
            client,
            runner_context.channel(),
            &guest_email,
            runner_context.config().think_time,
            rng,
        )
        .await;
        Ok(())
    })
}

fn log_failure(step: &str, guest_email: &str, failure: &StepFailure) {
    match failure {
        StepFailure::Transport(TransportFault::Status(status)) => {
            log::error!("{} request failed with status {}", step, status);
        }
        StepFailure::Transport(TransportFault::Unreachable(reason)) => {
            log::error!("{} request failed: {}", step, reason);
        }
        StepFailure::Parse(reason) => {
            log::error!("{} response could not be read: {}", step, reason);
        }
        StepFailure::NoUsableData => {
            log::warn!("{} response had nothing usable for {}", step, guest_email);
        }
        StepFailure::Business(errors) => {
            let errors = serde_json::to_string(errors).unwrap_or_else(|_| format!("{:?}", errors));
            log::warn!("{} rejected for {}: {}", step, guest_email, errors);
        }
    }
}
