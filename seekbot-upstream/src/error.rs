use thiserror::Error;

/// Failure classes for one upstream completion attempt or one logical request.
///
/// `Timeout` and `Network` are retryable (same-key retry, then rotation);
/// `Auth` and `Quota` rotate the key immediately; `MalformedResponse` and
/// `Exhausted` are terminal for the logical request.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream network error: {0}")]
    Network(String),

    #[error("Upstream rejected credential (status {0})")]
    Auth(u16),

    #[error("Upstream quota exceeded (status {0})")]
    Quota(u16),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("No available upstream capacity (all keys exhausted)")]
    Exhausted,
}

impl UpstreamError {
    /// True for errors worth retrying with the same key before rotating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Timeout | UpstreamError::Network(_))
    }

    /// True for errors attributable to the credential (rotate, no same-key retry).
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, UpstreamError::Auth(_) | UpstreamError::Quota(_))
    }
}
