use std::time::Duration;

/// Errors a transport can report while delivering one request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to reach the service endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {reason}")]
    Status {
        endpoint: String,
        status: u16,
        reason: String,
    },

    /// An I/O error occurred while sending or receiving.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A replay transport had no response queued for this request.
    #[error("no response queued for request #{0}")]
    Exhausted(usize),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
