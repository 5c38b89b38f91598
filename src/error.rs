//! Error types for the real closure engine.

use thiserror::Error;

/// Errors surfaced by the real closure engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RcfError {
    /// Dividing by a value that is provably zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Operation outside the domain of the requested function
    /// (zeroth root, even root of a negative number).
    #[error("{0}")]
    Domain(&'static str),
    /// The cancel flag was observed at a cooperation point.
    #[error("canceled")]
    Cancelled,
    /// An algebraic hook whose implementation is absent was invoked.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// Internal invariant violation. Treat as a bug signal.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RcfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RcfError::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            RcfError::Domain("even root of negative number").to_string(),
            "even root of negative number"
        );
        assert_eq!(RcfError::Cancelled.to_string(), "canceled");
        assert_eq!(
            RcfError::Unsupported("root isolation").to_string(),
            "unsupported operation: root isolation"
        );
    }
}
