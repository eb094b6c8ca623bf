//! Namespace URIs used on the wire and the prefixes bound to them.
//!
//! Outgoing envelopes always bind `s`, `m` and `t` on the root element.
//! Incoming documents may use any prefixes; names are compared by URI.

/// SOAP 1.1 envelope namespace.
pub const SOAPNS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Service messages namespace (request and response elements).
pub const MNS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";

/// Service types namespace (items, folders, ids).
pub const TNS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";

/// Service errors namespace (SOAP fault detail).
pub const ENS: &str = "http://schemas.microsoft.com/exchange/services/2006/errors";

/// Prefix bound to [`SOAPNS`].
pub const SOAP_PREFIX: &str = "s";
/// Prefix bound to [`MNS`].
pub const MESSAGES_PREFIX: &str = "m";
/// Prefix bound to [`TNS`].
pub const TYPES_PREFIX: &str = "t";

/// Well-known (prefix, namespace) bindings, in declaration order.
pub const BINDINGS: [(&str, &str); 3] = [
    (SOAP_PREFIX, SOAPNS),
    (MESSAGES_PREFIX, MNS),
    (TYPES_PREFIX, TNS),
];

/// Returns the outgoing prefix for a namespace URI, if it is well-known.
pub fn prefix_for(namespace: &str) -> Option<&'static str> {
    BINDINGS
        .iter()
        .find(|(_, uri)| *uri == namespace)
        .map(|(prefix, _)| *prefix)
}

/// Returns the namespace URI bound to a well-known prefix.
pub fn namespace_for(prefix: &str) -> Option<&'static str> {
    BINDINGS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}
