use gale_instruments::OutcomeKind;

use crate::checkout::CheckoutError;

/// Why a request never produced a usable response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    /// The target answered with a non-2xx status. The body is not read.
    #[error("status {0}")]
    Status(u16),
    /// No response at all, e.g. connection refused or timed out.
    #[error("unreachable: {0}")]
    Unreachable(String),
}

/// The ways a single scenario step can fail.
///
/// Every failure maps onto exactly one outcome counter, see [StepFailure::kind].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepFailure {
    #[error("transport failure, {0}")]
    Transport(#[from] TransportFault),
    #[error("unexpected response: {0}")]
    Parse(String),
    #[error("response contained no usable data")]
    NoUsableData,
    #[error("rejected with {} error(s)", .0.len())]
    Business(Vec<CheckoutError>),
}

impl StepFailure {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            StepFailure::Transport(_) => OutcomeKind::TransportFailure,
            StepFailure::Parse(_) => OutcomeKind::ParseFailure,
            StepFailure::NoUsableData => OutcomeKind::NoUsableData,
            StepFailure::Business(_) => OutcomeKind::BusinessFailure,
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        StepFailure::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_outcome_kinds() {
        assert_eq!(
            OutcomeKind::TransportFailure,
            StepFailure::Transport(TransportFault::Status(503)).kind()
        );
        assert_eq!(OutcomeKind::ParseFailure, StepFailure::parse("bad").kind());
        assert_eq!(OutcomeKind::NoUsableData, StepFailure::NoUsableData.kind());
        assert_eq!(
            OutcomeKind::BusinessFailure,
            StepFailure::Business(vec![]).kind()
        );
    }

    #[test]
    fn display_includes_status() {
        let failure: StepFailure = TransportFault::Status(502).into();
        assert_eq!("transport failure, status 502", failure.to_string());
    }
}
