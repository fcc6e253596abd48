use std::time::Duration;

use commerce_gale_runner::prelude::*;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG_BODY: &str = r#"{"data":{"products":{"edges":[
    {"node":{"id":"p1","variants":[{"id":"c1"}]}},
    {"node":{"id":"p2","variants":[{"id":"c2"},{"id":"c3"}]}},
    {"node":{"id":"p3","variants":[]}}
]}}}"#;

/// Starts a storefront mock. The server keeps running on its own thread once started.
fn storefront(catalog: ResponseTemplate, checkout: ResponseTemplate) -> MockServer {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Products"))
            .respond_with(catalog)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("checkoutCreate"))
            .respond_with(checkout)
            .mount(&server)
            .await;
        server
    })
}

fn scenario(
    name: &str,
    target_url: String,
    concurrency: usize,
    iterations: u64,
) -> ScenarioDefinitionBuilder<CommerceRunnerContext, CommerceAgentContext> {
    let config = RunConfig::new(
        target_url,
        "default-channel",
        concurrency,
        StopCondition::Iterations(iterations),
    )
    .with_think_time(Duration::from_millis(5))
    .with_request_timeout(Duration::from_secs(5))
    .with_seed(7);

    ScenarioDefinitionBuilder::from_config(name, config)
        .use_setup(configure_commerce_client)
        .use_agent_setup(seed_agent_rng)
        .use_agent_behaviour(guest_checkout_behaviour)
}

#[test]
fn every_iteration_runs_the_flow() {
    let server = storefront(
        ResponseTemplate::new(200).set_body_string(CATALOG_BODY),
        ResponseTemplate::new(200)
            .set_body_string(r#"{"data":{"checkoutCreate":{"checkout":{"id":"chk"},"errors":[]}}}"#),
    );

    let summary = run(scenario(
        "every_iteration_runs_the_flow",
        format!("{}/graphql/", server.uri()),
        3,
        4,
    ))
    .unwrap();

    let outcome = summary.outcome;
    assert_eq!(12, outcome.iterations);
    assert_eq!(3, summary.agent_end_count);

    let catalog = outcome.step_or_default(CATALOG_OPERATION);
    let checkout = outcome.step_or_default(CHECKOUT_OPERATION);
    assert_eq!(12, catalog.attempted);
    // p3 has no variants so some catalog fetches have nothing to check out
    assert_eq!(12, catalog.succeeded + catalog.no_usable_data);
    assert_eq!(catalog.succeeded, checkout.attempted);
    assert_eq!(checkout.attempted, checkout.succeeded);
}

#[test]
fn catalog_outage_prevents_checkouts() {
    let server = storefront(
        ResponseTemplate::new(503),
        ResponseTemplate::new(200)
            .set_body_string(r#"{"data":{"checkoutCreate":{"checkout":{"id":"chk"},"errors":[]}}}"#),
    );

    let summary = run(scenario(
        "catalog_outage_prevents_checkouts",
        server.uri(),
        2,
        3,
    ))
    .unwrap();

    let outcome = summary.outcome;
    assert_eq!(6, outcome.iterations);
    assert_eq!(6, outcome.step_or_default(CATALOG_OPERATION).failed_transport);
    assert_eq!(0, outcome.step_or_default(CHECKOUT_OPERATION).attempted);
}

#[test]
fn stock_rejections_are_counted_as_business_failures() {
    let server = storefront(
        ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"products":{"edges":[{"node":{"id":"p1","variants":[{"id":"c1"}]}}]}}}"#,
        ),
        ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"checkoutCreate":{"checkout":null,"errors":[{"field":"quantity","message":"Insufficient stock","code":"INSUFFICIENT_STOCK"}]}}}"#,
        ),
    );

    let summary = run(scenario(
        "stock_rejections_are_counted_as_business_failures",
        server.uri(),
        2,
        2,
    ))
    .unwrap();

    let checkout = summary.outcome.step_or_default(CHECKOUT_OPERATION);
    assert_eq!(4, checkout.attempted);
    assert_eq!(4, checkout.failed_business);
    assert_eq!(0, checkout.failed_parse);
    assert_eq!(0, checkout.succeeded);
}

#[test]
fn unreachable_target_does_not_stop_the_run() {
    // Nothing listens on the discard port
    let summary = run(scenario(
        "unreachable_target_does_not_stop_the_run",
        "http://127.0.0.1:9/graphql/".to_string(),
        2,
        2,
    ))
    .unwrap();

    let outcome = summary.outcome;
    assert_eq!(4, outcome.iterations);
    assert_eq!(2, summary.agent_end_count);
    assert_eq!(4, outcome.step_or_default(CATALOG_OPERATION).failed_transport);
    assert_eq!(0, outcome.step_or_default(CHECKOUT_OPERATION).attempted);
}

#[test]
fn behaviour_without_client_fails_each_iteration() {
    let config = RunConfig::new(
        "http://127.0.0.1:9/graphql/",
        "default-channel",
        1,
        StopCondition::Iterations(2),
    )
    .with_think_time(Duration::ZERO);

    let summary = run(
        ScenarioDefinitionBuilder::<CommerceRunnerContext, CommerceAgentContext>::from_config(
            "behaviour_without_client_fails_each_iteration",
            config,
        )
        .use_agent_behaviour(guest_checkout_behaviour),
    )
    .unwrap();

    // The hook errors are logged and the agent keeps going
    assert_eq!(2, summary.outcome.iterations);
    assert_eq!(1, summary.agent_end_count);
    assert_eq!(0, summary.outcome.step_or_default(CATALOG_OPERATION).attempted);
}
