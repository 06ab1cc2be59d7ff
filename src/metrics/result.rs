//! Outcome of a single request attempt

use std::time::Duration;

/// What one attempt produced: an HTTP status, or no response at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusOutcome {
    /// A response was received, whatever its code
    Status(u16),
    /// The request failed before any status was received
    TransportError,
}

impl StatusOutcome {
    pub fn is_transport_error(&self) -> bool {
        matches!(self, StatusOutcome::TransportError)
    }

    /// Status code, if a response was received
    pub fn code(&self) -> Option<u16> {
        match self {
            StatusOutcome::Status(code) => Some(*code),
            StatusOutcome::TransportError => None,
        }
    }
}

impl From<u16> for StatusOutcome {
    fn from(code: u16) -> Self {
        StatusOutcome::Status(code)
    }
}

impl std::fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusOutcome::Status(code) => write!(f, "{}", code),
            StatusOutcome::TransportError => write!(f, "error"),
        }
    }
}

/// Immutable record of one attempt, handed from a worker to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestResult {
    outcome: StatusOutcome,
    elapsed: Duration,
}

impl RequestResult {
    #[inline]
    pub fn new(outcome: StatusOutcome, elapsed: Duration) -> Self {
        Self { outcome, elapsed }
    }

    #[inline]
    pub fn outcome(&self) -> StatusOutcome {
        self.outcome
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_sorts_after_status_codes() {
        let mut outcomes = vec![
            StatusOutcome::TransportError,
            StatusOutcome::Status(500),
            StatusOutcome::Status(200),
        ];
        outcomes.sort();
        assert_eq!(
            outcomes,
            vec![
                StatusOutcome::Status(200),
                StatusOutcome::Status(500),
                StatusOutcome::TransportError,
            ]
        );
    }

    #[test]
    fn test_code_accessor() {
        assert_eq!(StatusOutcome::from(404).code(), Some(404));
        assert_eq!(StatusOutcome::TransportError.code(), None);
        assert!(StatusOutcome::TransportError.is_transport_error());
    }
}
