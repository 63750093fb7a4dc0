use thiserror::Error;

/// Failure of a single provider attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the message ({status}): {detail}")]
    Rejected {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{provider} did not respond within {secs}s")]
    Timeout { provider: &'static str, secs: u64 },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("primary email transport failed and fallback is disabled: {0}")]
    PrimaryFailed(#[source] TransportError),

    #[error("all email transports failed; primary: {primary}; secondary: {secondary}")]
    AllTransportsFailed {
        primary: TransportError,
        #[source]
        secondary: TransportError,
    },
}
