/// Return this error from an agent's behaviour function to indicate that the agent is bailing.
///
/// This should be used when an agent hits a problem that makes further iterations pointless for
/// that agent, but not for the run. The other agents keep going.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct AgentBailError {
    msg: String,
}

impl AgentBailError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl Default for AgentBailError {
    fn default() -> Self {
        Self {
            msg: "Agent is bailing".to_string(),
        }
    }
}
