use gantry_core::backoff::Retryable;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure classes for provider calls.
///
/// Every adapter normalizes its wire-level failures into these four classes
/// so callers can decide on retries without knowing which provider they are
/// talking to. [`Transport`](ProviderError::Transport) and
/// [`Provider`](ProviderError::Provider) are transient and worth retrying;
/// [`Rejected`](ProviderError::Rejected) and
/// [`NotFound`](ProviderError::NotFound) will not get better on their own.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No usable HTTP response: DNS, connect, TLS, or request timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider understood the request and said no (4xx).
    #[error("provider rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider failed on its side (5xx or a malformed reply).
    #[error("provider error: {0}")]
    Provider(String),

    /// The named resource, build, or deployment does not exist upstream.
    #[error("not found on provider: {0}")]
    NotFound(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_) | ProviderError::Provider(_)
        )
    }
}
