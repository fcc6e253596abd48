use std::sync::Arc;
use std::time::Duration;

use gale_instruments::{OperationRecord, OutcomeCounters, OutcomeKind};
use rand::Rng;
use serde_json::json;

use crate::catalog::{parse_catalog, select_variant, CatalogSelection, PRODUCTS_QUERY};
use crate::checkout::{parse_checkout, CHECKOUT_MUTATION};
use crate::error::StepFailure;
use crate::transport::{GraphQlRequest, GraphQlTransport, ReqwestTransport};

/// Operation id the catalog step is counted under.
pub const CATALOG_OPERATION: &str = "catalog";
/// Operation id the checkout step is counted under.
pub const CHECKOUT_OPERATION: &str = "checkout";

/// Storefront client which records the outcome of every step it performs.
///
/// Each call to [CommerceClient::fetch_catalog] or [CommerceClient::create_checkout] records
/// exactly one outcome, with its latency, whatever the result.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    transport: Arc<dyn GraphQlTransport>,
    counters: Arc<OutcomeCounters>,
}

impl CommerceClient {
    pub fn new(transport: Arc<dyn GraphQlTransport>, counters: Arc<OutcomeCounters>) -> Self {
        Self {
            transport,
            counters,
        }
    }

    /// Create a client talking HTTP to `target_url`.
    pub fn connect(
        target_url: &str,
        request_timeout: Duration,
        counters: Arc<OutcomeCounters>,
    ) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(target_url, request_timeout)?;
        Ok(Self::new(Arc::new(transport), counters))
    }

    /// Fetch the first page of the catalog and choose a variant from it.
    pub async fn fetch_catalog<R: Rng + ?Sized>(
        &self,
        channel: &str,
        rng: &mut R,
    ) -> Result<CatalogSelection, StepFailure> {
        let operation_record = OperationRecord::new(CATALOG_OPERATION);

        let request = GraphQlRequest::new(PRODUCTS_QUERY, json!({ "channel": channel }));
        let result = match self.transport.post(&request).await {
            Ok(response) => {
                parse_catalog(&response.body).and_then(|edges| select_variant(&edges, rng))
            }
            Err(fault) => Err(fault.into()),
        };

        self.record(&operation_record, &result);
        result
    }

    /// Create a guest checkout for one unit of `variant_id`, returning the checkout id.
    pub async fn create_checkout(
        &self,
        channel: &str,
        variant_id: &str,
        guest_email: &str,
    ) -> Result<String, StepFailure> {
        let operation_record = OperationRecord::new(CHECKOUT_OPERATION);

        let request = GraphQlRequest::new(
            CHECKOUT_MUTATION,
            json!({
                "channel": channel,
                "variantId": variant_id,
                "email": guest_email,
            }),
        );
        let result = match self.transport.post(&request).await {
            Ok(response) => {
                parse_checkout(&response.body).and_then(|checkout| checkout.into_checkout_id())
            }
            Err(fault) => Err(fault.into()),
        };

        self.record(&operation_record, &result);
        result
    }

    pub fn counters(&self) -> &Arc<OutcomeCounters> {
        &self.counters
    }

    fn record<T>(&self, operation_record: &OperationRecord, result: &Result<T, StepFailure>) {
        let kind = match result {
            Ok(_) => OutcomeKind::Succeeded,
            Err(failure) => failure.kind(),
        };
        self.counters.record(operation_record, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutError;
    use crate::error::TransportFault;
    use crate::transport::RawResponse;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::Value;
    use std::collections::VecDeque;

    /// Replays canned responses in order and remembers what was sent.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<RawResponse, TransportFault>>>,
        requests: Mutex<Vec<GraphQlRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: Vec<Result<RawResponse, TransportFault>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl GraphQlTransport for ScriptedTransport {
        async fn post(&self, request: &GraphQlRequest) -> Result<RawResponse, TransportFault> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Err(TransportFault::Unreachable("no more responses".to_string())))
        }
    }

    fn ok(body: &str) -> Result<RawResponse, TransportFault> {
        Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn client(transport: Arc<ScriptedTransport>) -> CommerceClient {
        CommerceClient::new(transport, Arc::new(OutcomeCounters::new()))
    }

    #[tokio::test]
    async fn catalog_unavailable() {
        let transport = ScriptedTransport::with(vec![Err(TransportFault::Status(503))]);
        let client = client(transport.clone());

        let result = client
            .fetch_catalog("default-channel", &mut StdRng::seed_from_u64(1))
            .await;

        assert_eq!(
            Err(StepFailure::Transport(TransportFault::Status(503))),
            result
        );
        let catalog = client.counters().snapshot().step_or_default(CATALOG_OPERATION);
        assert_eq!(1, catalog.attempted);
        assert_eq!(1, catalog.failed_transport);
    }

    #[tokio::test]
    async fn catalog_without_products() {
        let transport = ScriptedTransport::with(vec![ok(r#"{"data":{"products":{"edges":[]}}}"#)]);
        let client = client(transport);

        let result = client
            .fetch_catalog("default-channel", &mut StdRng::seed_from_u64(1))
            .await;

        assert_eq!(Err(StepFailure::NoUsableData), result);
        let catalog = client.counters().snapshot().step_or_default(CATALOG_OPERATION);
        assert_eq!(1, catalog.no_usable_data);
        assert_eq!(0, catalog.succeeded);
    }

    #[tokio::test]
    async fn catalog_sends_channel() {
        let transport = ScriptedTransport::with(vec![ok(
            r#"{"data":{"products":{"edges":[{"node":{"id":"p1","variants":[{"id":"c1"}]}}]}}}"#,
        )]);
        let client = client(transport.clone());

        let selection = client
            .fetch_catalog("eu-channel", &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();

        assert_eq!("c1", selection.variant_id);
        let requests = transport.requests.lock();
        assert_eq!(PRODUCTS_QUERY, requests[0].query);
        assert_eq!(Some(json!({ "channel": "eu-channel" })), requests[0].variables);
    }

    #[tokio::test]
    async fn checkout_created() {
        let transport = ScriptedTransport::with(vec![ok(
            r#"{"data":{"checkoutCreate":{"checkout":{"id":"chk-1"},"errors":[]}}}"#,
        )]);
        let client = client(transport.clone());

        let checkout_id = client
            .create_checkout("default-channel", "c1", "guest_3_7@example.com")
            .await
            .unwrap();

        assert_eq!("chk-1", checkout_id);
        let requests = transport.requests.lock();
        let variables = requests[0].variables.clone().unwrap_or(Value::Null);
        assert_eq!(json!("c1"), variables["variantId"]);
        assert_eq!(json!("guest_3_7@example.com"), variables["email"]);
        assert_eq!(json!("default-channel"), variables["channel"]);

        let checkout = client.counters().snapshot().step_or_default(CHECKOUT_OPERATION);
        assert_eq!(1, checkout.attempted);
        assert_eq!(1, checkout.succeeded);
    }

    #[tokio::test]
    async fn checkout_rejected_for_stock() {
        let transport = ScriptedTransport::with(vec![ok(
            r#"{"data":{"checkoutCreate":{"checkout":null,"errors":[{"field":"quantity","message":"Insufficient stock","code":"INSUFFICIENT_STOCK"}]}}}"#,
        )]);
        let client = client(transport);

        let result = client
            .create_checkout("default-channel", "c1", "guest_0_0@example.com")
            .await;

        match result {
            Err(StepFailure::Business(errors)) => {
                assert_eq!(Some("INSUFFICIENT_STOCK".to_string()), errors[0].code);
            }
            other => panic!("expected business failure, got {other:?}"),
        }
        let checkout = client.counters().snapshot().step_or_default(CHECKOUT_OPERATION);
        assert_eq!(1, checkout.failed_business);
        assert_eq!(0, checkout.failed_parse);
    }

    #[tokio::test]
    async fn checkout_without_id_or_errors() {
        let transport = ScriptedTransport::with(vec![ok(r#"{"data":{"checkoutCreate":{}}}"#)]);
        let client = client(transport);

        let result = client
            .create_checkout("default-channel", "c1", "guest_0_0@example.com")
            .await;

        assert!(matches!(result, Err(StepFailure::Parse(_))));
        let checkout = client.counters().snapshot().step_or_default(CHECKOUT_OPERATION);
        assert_eq!(1, checkout.failed_parse);
    }

    #[tokio::test]
    async fn checkout_transport_failure_is_counted() {
        let transport = ScriptedTransport::with(vec![Err(TransportFault::Status(502))]);
        let client = client(transport);

        let result = client
            .create_checkout("default-channel", "c1", "guest_0_0@example.com")
            .await;

        assert_eq!(
            Err(StepFailure::Transport(TransportFault::Status(502))),
            result
        );
        let checkout = client.counters().snapshot().step_or_default(CHECKOUT_OPERATION);
        assert_eq!(1, checkout.attempted);
        assert_eq!(1, checkout.failed_transport);
    }

    #[tokio::test]
    async fn top_level_graphql_errors() {
        let transport = ScriptedTransport::with(vec![ok(
            r#"{"errors":[{"message":"Invalid channel"}]}"#,
        )]);
        let client = client(transport);

        let result = client
            .create_checkout("nope", "c1", "guest_0_0@example.com")
            .await;

        assert_eq!(
            Err(StepFailure::Business(vec![CheckoutError {
                message: Some("Invalid channel".to_string()),
                ..Default::default()
            }])),
            result
        );
    }
}
