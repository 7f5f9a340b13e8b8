use thiserror::Error;

/// Errors raised by domain aggregates when a business rule is violated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid {entity} state transition from {from} to {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),
}
