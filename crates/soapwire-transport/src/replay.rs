use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{RawResponse, Transport};

/// In-memory transport that answers from a queue of canned responses.
///
/// Responses are handed out in push order regardless of which request asked
/// for them. Every envelope passed to [`Transport::send`] is recorded so
/// callers can inspect exactly what went over the wire.
pub struct ReplayTransport {
    endpoint: String,
    concurrency: usize,
    responses: Mutex<VecDeque<Result<RawResponse>>>,
    sent: Mutex<Vec<Bytes>>,
}

impl ReplayTransport {
    /// Create an empty replay transport for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            concurrency: 1,
            responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Advertise a worker-pool size to chunked dispatch.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Queue a response body.
    pub fn push_response(&self, body: impl Into<Bytes>) {
        lock(&self.responses).push_back(Ok(RawResponse::new(body)));
    }

    /// Queue a fully specified response.
    pub fn push_raw(&self, response: RawResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, err: TransportError) {
        lock(&self.responses).push_back(Err(err));
    }

    /// Envelopes sent so far, in send order.
    pub fn sent(&self) -> Vec<Bytes> {
        lock(&self.sent).clone()
    }

    /// Number of envelopes sent so far.
    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }

    /// Number of queued responses not yet consumed.
    pub fn pending(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl Transport for ReplayTransport {
    fn send(&self, envelope: &[u8]) -> Result<RawResponse> {
        let index = {
            let mut sent = lock(&self.sent);
            sent.push(Bytes::copy_from_slice(envelope));
            sent.len() - 1
        };

        match lock(&self.responses).pop_front() {
            Some(response) => {
                debug!(endpoint = %self.endpoint, request = index, "replaying queued response");
                response
            }
            None => Err(TransportError::Exhausted(index)),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn max_concurrency(&self) -> usize {
        self.concurrency
    }
}

impl fmt::Debug for ReplayTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayTransport")
            .field("endpoint", &self.endpoint)
            .field("concurrency", &self.concurrency)
            .field("pending", &self.pending())
            .field("sent", &self.sent_count())
            .finish()
    }
}

/// Transport backed by a closure that computes the response from the request.
pub struct FnTransport<F> {
    endpoint: String,
    concurrency: usize,
    handler: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&[u8]) -> Result<RawResponse> + Send + Sync,
{
    /// Create a transport that answers every request with `handler`.
    pub fn new(endpoint: impl Into<String>, handler: F) -> Self {
        Self {
            endpoint: endpoint.into(),
            concurrency: 1,
            handler,
        }
    }

    /// Advertise a worker-pool size to chunked dispatch.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&[u8]) -> Result<RawResponse> + Send + Sync,
{
    fn send(&self, envelope: &[u8]) -> Result<RawResponse> {
        (self.handler)(envelope)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn max_concurrency(&self) -> usize {
        self.concurrency
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport")
            .field("endpoint", &self.endpoint)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
