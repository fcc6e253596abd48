use gale_runner::prelude::UserValuesConstraint;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Per-agent values for a storefront scenario.
#[derive(Default, Debug)]
pub struct CommerceAgentContext {
    pub(crate) rng: Option<StdRng>,
}

impl UserValuesConstraint for CommerceAgentContext {}

impl CommerceAgentContext {
    /// The agent's random source, seeded from entropy unless [crate::prelude::seed_agent_rng] ran.
    pub fn rng(&mut self) -> &mut StdRng {
        self.rng.get_or_insert_with(StdRng::from_entropy)
    }
}
