use thiserror::Error;

/// Failure kinds of the accounting engine.
///
/// An operation that returns one of these has changed nothing: no record,
/// counter or balance. All but `InconsistentEvent` are caller-facing; that one
/// means a journaled event does not follow from the state it is applied to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LicensingError {
    #[error("voice license already initialized")]
    AlreadyInitialized,

    #[error("creator consent not confirmed")]
    ConsentNotConfirmed,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("voice license not found")]
    LicenseNotFound,

    #[error("usage record not found")]
    UsageRecordNotFound,

    #[error("not enough uses available for purchase (requested {requested}, available {available})")]
    InsufficientSupply { requested: u32, available: u32 },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("no uses remaining")]
    NoUsesRemaining,

    #[error("event does not fit current state: {0}")]
    InconsistentEvent(String),
}

impl LicensingError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::InconsistentEvent(msg.into())
    }

    /// Stable snake_case code for logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::ConsentNotConfirmed => "consent_not_confirmed",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::LicenseNotFound => "license_not_found",
            Self::UsageRecordNotFound => "usage_record_not_found",
            Self::InsufficientSupply { .. } => "insufficient_supply",
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::ArithmeticOverflow => "arithmetic_overflow",
            Self::NoUsesRemaining => "no_uses_remaining",
            Self::InconsistentEvent(_) => "inconsistent_event",
        }
    }

    /// Gated features must refuse unconditionally on these and must not retry;
    /// the caller is pointed at purchasing more uses instead.
    pub fn is_absolute_denial(&self) -> bool {
        matches!(self, Self::NoUsesRemaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exhausted_balance_is_an_absolute_denial() {
        assert!(LicensingError::NoUsesRemaining.is_absolute_denial());
        assert!(!LicensingError::UsageRecordNotFound.is_absolute_denial());
        assert!(!LicensingError::InsufficientFunds("x".into()).is_absolute_denial());
    }

    #[test]
    fn supply_message_carries_both_quantities() {
        let err = LicensingError::InsufficientSupply { requested: 7, available: 3 };
        assert_eq!(err.kind(), "insufficient_supply");
        assert!(err.to_string().contains("requested 7, available 3"));
    }
}
