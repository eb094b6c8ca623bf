use soapwire_envelope::EnvelopeError;
use soapwire_transport::TransportError;

use crate::codes::BATCH_PROCESSING_STOPPED;
use crate::fault::Fault;

/// Errors raised by service dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The transport failed to deliver the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be wrapped or the response could not be parsed.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The response parsed but does not have a shape the service produces.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A SOAP fault whose code is not in the response-code registry.
    #[error("SOAP fault: {0}")]
    Fault(Fault),

    /// A response code recognized by the registry.
    #[error("{code}: {message}")]
    Response {
        code: String,
        message: String,
        /// Routine remote condition (quota, throttling, access, availability).
        expected: bool,
    },

    /// A response code the registry does not know.
    #[error("unknown response code {code} (MessageText: {text}, MessageXml: {xml})")]
    UnknownCode {
        code: String,
        text: String,
        xml: String,
    },

    /// The operation is not available on the connected server version.
    #[error("{operation} requires server major version {required} or later (server is {actual})")]
    Unsupported {
        operation: &'static str,
        required: u8,
        actual: u8,
    },

    /// The caller supplied arguments the operation cannot encode.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// True for classified response codes marked as expected remote conditions.
    pub fn is_expected(&self) -> bool {
        matches!(self, ServiceError::Response { expected: true, .. })
    }

    /// True for failures that propagate without diagnostic capture.
    pub fn is_routine(&self) -> bool {
        self.is_expected() || matches!(self, ServiceError::Transport(_))
    }

    /// The raw response code carried by this error, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ServiceError::Response { code, .. } | ServiceError::UnknownCode { code, .. } => {
                Some(code)
            }
            _ => None,
        }
    }

    /// True if the server stopped processing the rest of a batch.
    pub fn is_batch_stopped(&self) -> bool {
        self.code() == Some(BATCH_PROCESSING_STOPPED)
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
