use std::sync::Arc;

use soapwire_envelope::{unwrap, Element, ENS, MNS, SOAPNS, TNS};
use soapwire_transport::ReplayTransport;

use crate::service::Service;
use crate::version::ServerVersion;

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="{SOAPNS}" xmlns:m="{MNS}" xmlns:t="{TNS}" xmlns:e="{ENS}"><s:Body>{body}</s:Body></s:Envelope>"#
    )
}

pub fn response(op: &str, messages: &[String]) -> String {
    envelope(&format!(
        "<m:{op}Response><m:ResponseMessages>{}</m:ResponseMessages></m:{op}Response>",
        messages.concat()
    ))
}

pub fn message(op: &str, class: &str, code: &str, inner: &str) -> String {
    format!(
        r#"<m:{op}ResponseMessage ResponseClass="{class}"><m:ResponseCode>{code}</m:ResponseCode>{inner}</m:{op}ResponseMessage>"#
    )
}

pub fn root_folder(op: &str, attrs: &str, inner: &str) -> String {
    message(
        op,
        "Success",
        "NoError",
        &format!("<m:RootFolder {attrs}>{inner}</m:RootFolder>"),
    )
}

pub fn fault(code: &str, detail_code: Option<&str>) -> String {
    let detail = detail_code
        .map(|code| {
            format!(
                "<detail><e:ResponseCode>{code}</e:ResponseCode><e:Message>detail message</e:Message></detail>"
            )
        })
        .unwrap_or_default();
    format!("<s:Fault><faultcode>{code}</faultcode><faultstring>boom</faultstring>{detail}</s:Fault>")
}

/// Parse a fragment that uses the `m`/`t` prefixes.
pub fn fragment(source: &str) -> Element {
    let wrapped = format!(r#"<root xmlns:m="{MNS}" xmlns:t="{TNS}">{source}</root>"#);
    unwrap(wrapped.as_bytes(), None, &Default::default())
        .expect("fragment should parse")
        .children
        .into_iter()
        .next()
        .expect("fragment should have an element")
}

/// A 2010 service answering from `bodies` in order.
pub fn service_for(bodies: Vec<String>) -> (Service, Arc<ReplayTransport>) {
    service_with_version(bodies, ServerVersion::V2010)
}

pub fn service_with_version(
    bodies: Vec<String>,
    version: ServerVersion,
) -> (Service, Arc<ReplayTransport>) {
    let transport = Arc::new(ReplayTransport::new("mem://test"));
    for body in bodies {
        transport.push_response(body);
    }
    let service = Service::new(Arc::clone(&transport) as _, version);
    (service, transport)
}
