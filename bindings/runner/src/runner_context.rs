use anyhow::Context;
use commerce_client_instrumented::prelude::CommerceClient;
use gale_runner::prelude::{GaleResult, UserValuesConstraint};

/// Values shared by every agent in a storefront scenario.
#[derive(Default, Debug)]
pub struct CommerceRunnerContext {
    pub(crate) client: Option<CommerceClient>,
}

impl UserValuesConstraint for CommerceRunnerContext {}

impl CommerceRunnerContext {
    /// Get the shared storefront client.
    ///
    /// Only available after [crate::prelude::configure_commerce_client] has run in the scenario setup.
    pub fn client(&self) -> GaleResult<&CommerceClient> {
        self.client.as_ref().context(
            "Storefront client is not configured, call 'configure_commerce_client' in the scenario setup",
        )
    }
}
