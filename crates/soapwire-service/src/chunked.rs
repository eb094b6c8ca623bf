use std::slice::Chunks;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use soapwire_envelope::Element;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, ServiceError};
use crate::message::Outcome;
use crate::operation::Operation;
use crate::service::Service;

/// Split `items` into contiguous chunks of at most `size` items.
pub fn chunkify<T>(items: &[T], size: usize) -> Chunks<'_, T> {
    items.chunks(size.max(1))
}

type Slot = Mutex<Option<Result<Vec<Outcome>>>>;

/// Runs one bulk operation as several bounded requests in parallel.
///
/// Chunks are handed to a pool of scoped worker threads sized by the
/// transport's concurrency limit. Each chunk's outcomes land in a slot
/// indexed by chunk position, so the concatenated output follows input
/// order no matter which chunk finishes first.
///
/// After the first failure no new chunks are started; chunks already in
/// flight finish, and the error of the lowest failing chunk is returned.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedDispatcher<'a> {
    dispatcher: Dispatcher<'a>,
    chunk_size: Option<usize>,
}

impl<'a> ChunkedDispatcher<'a> {
    /// Chunk by the operation's declared chunk size.
    pub fn new(service: &'a Service, operation: &'a Operation) -> Self {
        Self {
            dispatcher: Dispatcher::new(service, operation),
            chunk_size: operation.chunk_size,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Dispatch `items` in chunks, building each request with `build`.
    pub fn dispatch<T, F>(&self, items: &[T], build: F) -> Result<Vec<Outcome>>
    where
        T: Sync,
        F: Fn(&[T]) -> Result<Element> + Sync,
    {
        self.dispatcher.ensure_supported()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.chunk_size.unwrap_or(items.len());
        let chunks: Vec<&[T]> = chunkify(items, chunk_size).collect();
        let service = self.dispatcher.service();
        let workers = service
            .transport()
            .max_concurrency()
            .clamp(1, chunks.len());
        debug!(
            endpoint = %service.endpoint(),
            service = self.dispatcher.operation().name,
            items = items.len(),
            chunk_size,
            chunks = chunks.len(),
            workers,
            "dispatching in chunks"
        );

        let slots: Vec<Slot> = chunks.iter().map(|_| Mutex::new(None)).collect();
        let next = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    while !failed.load(Ordering::Acquire) {
                        let index = next.fetch_add(1, Ordering::AcqRel);
                        let Some(chunk) = chunks.get(index) else {
                            break;
                        };
                        debug!(chunk = index, items = chunk.len(), "dispatching chunk");
                        let result = build(chunk).and_then(|payload| {
                            self.dispatcher
                                .capture(self.dispatcher.send_and_parse(&payload))
                        });
                        if result.is_err() {
                            failed.store(true, Ordering::Release);
                        }
                        *slots[index].lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                    }
                });
            }
        });

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot.into_inner().unwrap_or_else(PoisonError::into_inner) {
                Some(Ok(chunk)) => outcomes.extend(chunk),
                Some(Err(err)) => return Err(err),
                // Chunks start in index order, so an unstarted chunk always
                // follows the failed one.
                None => {
                    return Err(ServiceError::Protocol(format!(
                        "chunk {index} was never dispatched"
                    )))
                }
            }
        }
        Ok(outcomes)
    }
}
