use commerce_gale_runner::prelude::*;

fn setup(ctx: &mut RunnerContext<CommerceRunnerContext>) -> HookResult {
    configure_commerce_client(ctx)?;
    Ok(())
}

fn agent_setup(ctx: &mut AgentContext<CommerceRunnerContext, CommerceAgentContext>) -> HookResult {
    seed_agent_rng(ctx)?;
    Ok(())
}

fn main() -> GaleResult<()> {
    let builder =
        ScenarioDefinitionBuilder::<CommerceRunnerContext, CommerceAgentContext>::new_with_init(
            env!("CARGO_PKG_NAME"),
        )
        .with_default_concurrency(1000)
        .with_default_iterations(5)
        .use_setup(setup)
        .use_agent_setup(agent_setup)
        .use_agent_behaviour(guest_checkout_behaviour);

    let summary = run(builder)?;

    let checkout = summary.outcome.step_or_default(CHECKOUT_OPERATION);
    log::info!(
        "Created {} of {} attempted checkouts over {} iterations",
        checkout.succeeded,
        checkout.attempted,
        summary.outcome.iterations
    );

    Ok(())
}
