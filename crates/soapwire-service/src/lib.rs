//! Service dispatch for the soapwire client.
//!
//! This is the layer every concrete operation is declared on top of:
//! - [`Dispatcher`] runs one request: build payload, wrap, send, unwrap,
//!   and turn each per-item response message into an [`Outcome`] or a
//!   [`ServiceError`]
//! - [`Pager`] walks server-windowed result sets offset by offset
//! - [`ChunkedDispatcher`] splits bulk input into bounded chunks, sends them
//!   concurrently and reassembles results in input order
//! - [`CodeRegistry`] maps the open-ended vocabulary of response codes to
//!   error dispositions
//!
//! Operations themselves live in [`operations`] and are plain declarations
//! of names, containers and payload layouts.

pub mod chunked;
pub mod codes;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fault;
pub mod message;
pub mod operation;
pub mod operations;
pub mod pager;
pub mod service;
pub mod version;

#[cfg(test)]
mod testutil;

pub use chunked::{chunkify, ChunkedDispatcher};
pub use codes::{CodeRegistry, Disposition, BATCH_PROCESSING_STOPPED, NO_ERROR};
pub use config::{ServiceConfig, DEFAULT_MAX_PAGES};
pub use dispatcher::Dispatcher;
pub use error::{Result, ServiceError};
pub use fault::{Fault, FaultDetail};
pub use message::{Outcome, ResponseClass};
pub use operation::Operation;
pub use pager::{Page, PageState, Pager};
pub use service::{Account, Service};
pub use version::ServerVersion;
