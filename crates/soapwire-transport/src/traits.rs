use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;

/// Raw response as delivered by the transport, before any XML parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Response body bytes.
    pub body: Bytes,
    /// Charset label taken from the response headers, if the server sent one.
    pub encoding: Option<String>,
}

impl RawResponse {
    /// Create a response with no declared encoding.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            encoding: None,
        }
    }

    /// Attach the charset label reported by the server.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// True if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Delivers one wrapped request envelope and returns the raw response.
///
/// The dispatch layers make at most one `send` call per physical request and
/// never retry on their own. Chunked dispatch calls `send` from several
/// threads at once, bounded by [`Transport::max_concurrency`].
pub trait Transport: Send + Sync {
    /// Send `envelope` and wait for the response body.
    fn send(&self, envelope: &[u8]) -> Result<RawResponse>;

    /// Endpoint URL, used for diagnostics only.
    fn endpoint(&self) -> &str;

    /// How many requests the transport is willing to run concurrently.
    fn max_concurrency(&self) -> usize {
        1
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, envelope: &[u8]) -> Result<RawResponse> {
        (**self).send(envelope)
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn max_concurrency(&self) -> usize {
        (**self).max_concurrency()
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, envelope: &[u8]) -> Result<RawResponse> {
        (**self).send(envelope)
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn max_concurrency(&self) -> usize {
        (**self).max_concurrency()
    }
}
