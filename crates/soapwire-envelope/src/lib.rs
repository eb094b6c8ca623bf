//! SOAP envelope codec for the soapwire service client.
//!
//! Every request is a payload fragment wrapped in the same outer envelope:
//! - `s:Header` carrying the requested server version and, optionally, the
//!   impersonated mailbox
//! - `s:Body` carrying exactly one operation element
//!
//! Responses are parsed into an owned, namespace-resolved [`Element`] tree
//! with structural equality, so the layers above can pick it apart without
//! holding on to the raw bytes.

pub mod codec;
pub mod element;
pub mod error;
pub mod ns;

pub use codec::{to_xml, unwrap, wrap, EnvelopeConfig, DEFAULT_MAX_RESPONSE_SIZE};
pub use element::{Element, QName};
pub use error::{EnvelopeError, Result};
pub use ns::{ENS, MNS, SOAPNS, TNS};
