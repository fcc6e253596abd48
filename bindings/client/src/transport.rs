use std::fmt::Debug;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportFault;

/// A GraphQL request body, `{ "query": ..., "variables": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    pub query: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphQlRequest {
    pub fn new(query: &'static str, variables: Value) -> Self {
        Self {
            query,
            variables: Some(variables),
        }
    }
}

/// A 2xx response from the target, with its body unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends GraphQL requests to the target.
///
/// Implementations must turn any non-2xx status into [TransportFault::Status] without reading the
/// body, and any connection level problem into [TransportFault::Unreachable].
#[async_trait::async_trait]
pub trait GraphQlTransport: Debug + Send + Sync {
    async fn post(&self, request: &GraphQlRequest) -> Result<RawResponse, TransportFault>;
}

/// [GraphQlTransport] over HTTP using a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    target_url: url::Url,
}

impl ReqwestTransport {
    pub fn new(target_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let target_url = url::Url::parse(target_url)
            .with_context(|| format!("Invalid target URL: {}", target_url))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, target_url })
    }

    pub fn target_url(&self) -> &url::Url {
        &self.target_url
    }
}

#[async_trait::async_trait]
impl GraphQlTransport for ReqwestTransport {
    async fn post(&self, request: &GraphQlRequest) -> Result<RawResponse, TransportFault> {
        let response = self
            .client
            .post(self.target_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportFault::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFault::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportFault::Unreachable(e.to_string()))?;

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
