//! Transport abstraction for the soapwire service client.
//!
//! This is the lowest layer of soapwire. The dispatch layers above hand a
//! fully wrapped request envelope to a [`Transport`] and get back the raw
//! response body. Connection pooling, authentication and retry policy all
//! live behind the trait:
//! - [`Transport`] is implemented by the embedding application (HTTP client,
//!   session pool, credentials)
//! - [`ReplayTransport`] and [`FnTransport`] are in-memory implementations
//!   for offline inspection and tests

pub mod error;
pub mod replay;
pub mod traits;

pub use error::{Result, TransportError};
pub use replay::{FnTransport, ReplayTransport};
pub use traits::{RawResponse, Transport};
