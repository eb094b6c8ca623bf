use std::borrow::Cow;
use std::fmt;

use crate::ns::{namespace_for, MNS, SOAPNS, TNS};

/// A namespace-qualified XML name.
///
/// Displayed in Clark notation (`{namespace}local`), or as the bare local
/// name when unqualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    ns: Option<Cow<'static, str>>,
    local: Cow<'static, str>,
}

impl QName {
    /// A name in `ns`.
    pub const fn new(ns: &'static str, local: &'static str) -> Self {
        Self {
            ns: Some(Cow::Borrowed(ns)),
            local: Cow::Borrowed(local),
        }
    }

    /// A name with no namespace.
    pub const fn unqualified(local: &'static str) -> Self {
        Self {
            ns: None,
            local: Cow::Borrowed(local),
        }
    }

    /// A name in the SOAP envelope namespace.
    pub const fn soap(local: &'static str) -> Self {
        Self::new(SOAPNS, local)
    }

    /// A name in the service messages namespace.
    pub const fn messages(local: &'static str) -> Self {
        Self::new(MNS, local)
    }

    /// A name in the service types namespace.
    pub const fn types(local: &'static str) -> Self {
        Self::new(TNS, local)
    }

    /// A name built from runtime strings.
    pub fn owned(ns: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            ns: ns.map(|ns| Cow::Owned(ns.to_string())),
            local: Cow::Owned(local.into()),
        }
    }

    /// Parse `{ns}local`, `prefix:local` (well-known prefixes only) or `local`.
    pub fn parse(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix('{') {
            if let Some((ns, local)) = rest.split_once('}') {
                return Self::owned(Some(ns), local);
            }
        }
        if let Some((prefix, local)) = name.split_once(':') {
            if let Some(ns) = namespace_for(prefix) {
                return Self::owned(Some(ns), local);
            }
        }
        Self::owned(None, name)
    }

    /// Namespace URI, if qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// Local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An owned XML element.
///
/// Attributes and children keep document order. Text is the concatenated,
/// trimmed character data directly inside the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<(QName, String)>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Add an unqualified attribute.
    pub fn with_attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set_attr(QName::unqualified(name), value);
        self
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// True if this element has the given name.
    pub fn is(&self, name: &QName) -> bool {
        self.name == *name
    }

    /// Value of the unqualified attribute `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.namespace().is_none() && n.local_name() == local)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child named `name`.
    pub fn find(&self, name: &QName) -> Option<&Element> {
        self.children.iter().find(|c| c.is(name))
    }

    /// All direct children named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &QName) -> impl Iterator<Item = &'a Element> + 'a {
        let name = name.clone();
        self.children.iter().filter(move |c| c.is(&name))
    }

    /// Text of the first direct child named `name`.
    pub fn child_text(&self, name: &QName) -> Option<&str> {
        self.find(name).and_then(Element::text)
    }

    /// Remove and return the first direct child named `name`.
    pub fn take(&mut self, name: &QName) -> Option<Element> {
        let index = self.children.iter().position(|c| c.is(name))?;
        Some(self.children.remove(index))
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clark_and_prefixed_names() {
        assert_eq!(QName::parse("{urn:x}Item"), QName::owned(Some("urn:x"), "Item"));
        assert_eq!(QName::parse("m:Items"), QName::messages("Items"));
        assert_eq!(QName::parse("t:Folder"), QName::types("Folder"));
        assert_eq!(QName::parse("faultcode"), QName::unqualified("faultcode"));
        assert_eq!(QName::parse("x:Unknown"), QName::unqualified("x:Unknown"));
    }

    #[test]
    fn borrowed_and_owned_names_compare_equal() {
        assert_eq!(QName::types("Message"), QName::owned(Some(TNS), "Message"));
    }

    #[test]
    fn display_uses_clark_notation() {
        assert_eq!(QName::soap("Body").to_string(), format!("{{{SOAPNS}}}Body"));
        assert_eq!(QName::unqualified("detail").to_string(), "detail");
    }

    #[test]
    fn lookups_follow_document_order() {
        let root = Element::new(QName::messages("Items"))
            .with_child(Element::new(QName::types("Message")).with_attr("n", "1"))
            .with_child(Element::new(QName::types("Contact")))
            .with_child(Element::new(QName::types("Message")).with_attr("n", "2"));

        let name = QName::types("Message");
        let found: Vec<_> = root.find_all(&name).filter_map(|e| e.attr("n")).collect();
        assert_eq!(found, vec!["1", "2"]);
        assert_eq!(root.find(&name).and_then(|e| e.attr("n")), Some("1"));
    }

    #[test]
    fn find_all_accepts_temporary_name() {
        let root = Element::new(QName::messages("ResolveNames"))
            .with_child(Element::new(QName::messages("UnresolvedEntry")).with_text("alice"))
            .with_child(Element::new(QName::messages("UnresolvedEntry")).with_text("bob"));

        let entries: Vec<_> = root
            .find_all(&QName::messages("UnresolvedEntry"))
            .filter_map(Element::text)
            .collect();
        assert_eq!(entries, vec!["alice", "bob"]);
    }

    #[test]
    fn set_attr_replaces_existing_value() {
        let mut el = Element::new(QName::types("ItemId")).with_attr("Id", "a");
        el.set_attr(QName::unqualified("Id"), "b");
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.attr("Id"), Some("b"));
    }

    #[test]
    fn take_removes_first_match() {
        let mut el = Element::new(QName::messages("Msg"))
            .with_child(Element::new(QName::messages("ResponseCode")).with_text("NoError"))
            .with_child(Element::new(QName::messages("Items")));

        let items = el.take(&QName::messages("Items")).expect("items should exist");
        assert!(items.is(&QName::messages("Items")));
        assert!(el.find(&QName::messages("Items")).is_none());
        assert_eq!(el.child_text(&QName::messages("ResponseCode")), Some("NoError"));
    }
}
