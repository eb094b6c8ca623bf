use bytes::Bytes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};
use tracing::trace;

use crate::element::{Element, QName};
use crate::error::{EnvelopeError, Result};
use crate::ns::{prefix_for, BINDINGS};

/// Default maximum response body size: 64 MiB.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const HEADER: QName = QName::soap("Header");
const REQUEST_SERVER_VERSION: QName = QName::types("RequestServerVersion");
const EXCHANGE_IMPERSONATION: QName = QName::types("ExchangeImpersonation");
const CONNECTING_SID: QName = QName::types("ConnectingSID");
const PRIMARY_SMTP_ADDRESS: QName = QName::types("PrimarySmtpAddress");

/// Configuration for the envelope codec.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Maximum response body size in bytes. Default: 64 MiB.
    pub max_response_size: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// Wrap a payload fragment in the outer request envelope.
///
/// Wire format:
/// ```text
/// <?xml version="1.0" encoding="utf-8"?>
/// <s:Envelope xmlns:s=".." xmlns:m=".." xmlns:t="..">
///   <s:Header>
///     <t:RequestServerVersion Version="{version}"/>
///     <t:ExchangeImpersonation>            (only when impersonating)
///       <t:ConnectingSID><t:PrimarySmtpAddress>..</t:PrimarySmtpAddress></t:ConnectingSID>
///     </t:ExchangeImpersonation>
///   </s:Header>
///   <s:Body>{content}</s:Body>
/// </s:Envelope>
/// ```
pub fn wrap(content: &Element, version: &str, impersonation: Option<&str>) -> Result<Bytes> {
    let mut header = Element::new(HEADER)
        .with_child(Element::new(REQUEST_SERVER_VERSION).with_attr("Version", version));
    if let Some(address) = impersonation {
        header.push(
            Element::new(EXCHANGE_IMPERSONATION).with_child(
                Element::new(CONNECTING_SID)
                    .with_child(Element::new(PRIMARY_SMTP_ADDRESS).with_text(address)),
            ),
        );
    }

    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;

    let mut root = BytesStart::new("s:Envelope");
    for (prefix, uri) in BINDINGS {
        root.push_attribute((format!("xmlns:{prefix}").as_str(), uri));
    }
    emit(&mut writer, Event::Start(root))?;
    write_element(&mut writer, &header, None, &[])?;
    emit(&mut writer, Event::Start(BytesStart::new("s:Body")))?;
    write_element(&mut writer, content, None, &[])?;
    emit(&mut writer, Event::End(BytesEnd::new("s:Body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("s:Envelope")))?;

    let bytes = writer.into_inner();
    trace!(size = bytes.len(), "wrapped request envelope");
    Ok(Bytes::from(bytes))
}

/// Parse a raw response body into its root element.
///
/// `encoding` is the charset label the transport reported, if any. Only
/// UTF-8 (and its ASCII subset) is decoded; a leading byte-order mark is
/// skipped.
pub fn unwrap(raw: &[u8], encoding: Option<&str>, config: &EnvelopeConfig) -> Result<Element> {
    if raw.len() > config.max_response_size {
        return Err(EnvelopeError::TooLarge {
            size: raw.len(),
            max: config.max_response_size,
        });
    }
    if let Some(label) = encoding {
        check_encoding(label)?;
    }

    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = std::str::from_utf8(raw)
        .map_err(|err| EnvelopeError::Malformed(format!("invalid UTF-8: {err}")))?;
    parse_document(text)
}

/// Serialize a standalone fragment, declaring the well-known prefixes it uses.
///
/// Used for diagnostics; the output is not wrapped in an envelope.
pub fn to_xml(element: &Element) -> Result<String> {
    let declare: Vec<(&str, &str)> = BINDINGS
        .iter()
        .copied()
        .filter(|(_, uri)| uses_namespace(element, uri))
        .collect();

    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, None, &declare)?;
    String::from_utf8(writer.into_inner()).map_err(|err| EnvelopeError::Write(err.to_string()))
}

fn check_encoding(label: &str) -> Result<()> {
    match label.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => Ok(()),
        _ => Err(EnvelopeError::UnsupportedEncoding(label.to_string())),
    }
}

fn parse_document(text: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
        let ns = owned_namespace(ns)?;
        match event {
            Event::Start(start) => {
                stack.push(start_element(&reader, ns, &start)?);
            }
            Event::Empty(start) => {
                let element = start_element(&reader, ns, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| EnvelopeError::Malformed("unbalanced end tag".to_string()))?;
                drop_layout_text(&mut element);
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    append_text(top, &text.unescape().map_err(malformed)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    append_text(top, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(EnvelopeError::Malformed(
            "unexpected end of document".to_string(),
        ));
    }
    root.ok_or_else(|| EnvelopeError::Malformed("document has no root element".to_string()))
}

fn start_element(
    reader: &NsReader<&[u8]>,
    ns: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element> {
    let local = decode_name(start.local_name().as_ref())?;
    let mut element = Element::new(QName::owned(ns.as_deref(), local));

    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (attr_ns, attr_local) = reader.resolve_attribute(attr.key);
        let attr_ns = owned_namespace(attr_ns)?;
        let name = QName::owned(attr_ns.as_deref(), decode_name(attr_local.as_ref())?);
        let value = attr.unescape_value().map_err(malformed)?;
        element.attributes.push((name, value.into_owned()));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(EnvelopeError::Malformed(
            "multiple root elements".to_string(),
        )),
    }
}

/// Whitespace between child elements is layout, not content. Text of leaf
/// elements is kept exactly as sent.
fn drop_layout_text(element: &mut Element) {
    let layout = element
        .text
        .as_deref()
        .is_some_and(|text| text.trim().is_empty());
    if layout && !element.children.is_empty() {
        element.text = None;
    }
}

fn append_text(element: &mut Element, text: &str) {
    match &mut element.text {
        Some(existing) => existing.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}

fn owned_namespace(ns: ResolveResult<'_>) -> Result<Option<String>> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(decode_name(uri)?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(EnvelopeError::Malformed(format!(
            "unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn decode_name(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| EnvelopeError::Malformed(format!("invalid UTF-8 in name: {err}")))
}

fn malformed(err: impl std::fmt::Display) -> EnvelopeError {
    EnvelopeError::Malformed(err.to_string())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|err| EnvelopeError::Write(err.to_string()))
}

/// Write `element` and its subtree.
///
/// Well-known namespaces are written with their bound prefix. Any other
/// namespace becomes the default namespace of the element that introduces
/// it; `default_ns` tracks what is currently in scope so unqualified
/// children can reset it.
fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    default_ns: Option<&str>,
    declare: &[(&str, &str)],
) -> Result<()> {
    let local = element.name.local_name();
    let mut default_decl: Option<&str> = None;
    let (tag, child_default) = match element.name.namespace() {
        Some(ns) => match prefix_for(ns) {
            Some(prefix) => (format!("{prefix}:{local}"), default_ns),
            None => {
                if default_ns != Some(ns) {
                    default_decl = Some(ns);
                }
                (local.to_string(), Some(ns))
            }
        },
        None => {
            if default_ns.is_some() {
                default_decl = Some("");
            }
            (local.to_string(), None)
        }
    };

    let mut start = BytesStart::new(tag.as_str());
    for (prefix, uri) in declare {
        start.push_attribute((format!("xmlns:{prefix}").as_str(), *uri));
    }
    if let Some(ns) = default_decl {
        start.push_attribute(("xmlns", ns));
    }

    let mut generated = 0usize;
    for (name, value) in &element.attributes {
        let key = match name.namespace() {
            None => name.local_name().to_string(),
            Some(ns) => match prefix_for(ns) {
                Some(prefix) => format!("{prefix}:{}", name.local_name()),
                None => {
                    let prefix = format!("ns{generated}");
                    generated += 1;
                    start.push_attribute((format!("xmlns:{prefix}").as_str(), ns));
                    format!("{prefix}:{}", name.local_name())
                }
            },
        };
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = &element.text {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child, child_default, &[])?;
    }
    emit(writer, Event::End(BytesEnd::new(tag.as_str())))
}

fn uses_namespace(element: &Element, uri: &str) -> bool {
    element.name.namespace() == Some(uri)
        || element
            .attributes
            .iter()
            .any(|(name, _)| name.namespace() == Some(uri))
        || element.children.iter().any(|c| uses_namespace(c, uri))
}
