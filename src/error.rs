use crate::checkout::Step;

/// Why a checkout session was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Failed to {}: {status}", .step.action())]
    Status { step: Step, status: u16 },
    #[error("Invalid response format: {reason}")]
    Body { step: Step, reason: String },
    #[error("{} needs a {missing} from the previous step", .step.name())]
    MissingPrecondition { step: Step, missing: &'static str },
}

impl CheckoutError {
    pub fn step(&self) -> Step {
        match self {
            CheckoutError::Status { step, .. }
            | CheckoutError::Body { step, .. }
            | CheckoutError::MissingPrecondition { step, .. } => *step,
        }
    }

    /// True when a request was sent and its outcome should be flagged.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, CheckoutError::MissingPrecondition { .. })
    }
}
