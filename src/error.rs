use thiserror::Error;

/// Failures surfaced by a resolution call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid trade intent: {0}")]
    InvalidIntent(String),

    #[error("no route found: neither builder returned a transaction")]
    NoRouteFound,

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("builder request timed out")]
    RequestTimeout,
}

impl ResolveError {
    /// Whether the caller may simply retry or pick another token.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ResolveError::NoRouteFound | ResolveError::RequestTimeout)
    }
}
