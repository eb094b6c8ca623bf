//! Client-side dispatch layer for SOAP/XML request-response services.
//!
//! soapwire turns logical operations (find items, create items, resolve
//! names, ...) into request envelopes, sends them through a caller-supplied
//! transport, and turns responses into ordered per-item outcomes or typed
//! errors. Paged result sets are walked transparently and bulk operations
//! are split into bounded chunks that run concurrently without losing
//! input order.
//!
//! # Crate Structure
//!
//! - [`transport`]: the `Transport` trait and in-memory transports
//! - [`envelope`]: XML element tree and the envelope codec
//! - [`service`]: response-code taxonomy, dispatcher, pager, chunked dispatch
//!   and the concrete operations

/// Re-export transport types.
pub mod transport {
    pub use soapwire_transport::*;
}

/// Re-export envelope types.
pub mod envelope {
    pub use soapwire_envelope::*;
}

/// Re-export service types.
pub mod service {
    pub use soapwire_service::*;
}

pub use soapwire_envelope::{Element, QName};
pub use soapwire_service::operations;
pub use soapwire_service::{
    Account, CodeRegistry, Outcome, Result, ServerVersion, Service, ServiceConfig, ServiceError,
};
pub use soapwire_transport::{RawResponse, Transport, TransportError};
