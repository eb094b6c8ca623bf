use soapwire_envelope::{Element, QName, MNS};

/// Static description of a remote operation.
///
/// `name` names the request element (`m:{name}`), the response element
/// (`m:{name}Response`) and each response message
/// (`m:{name}ResponseMessage`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    /// Element holding the result list inside each response message.
    pub container: Option<QName>,
    /// Element names recognized as results inside the container.
    /// Empty means every child is a result.
    pub elements: Vec<QName>,
    pub min_major_version: Option<u8>,
    pub chunk_size: Option<usize>,
}

impl Operation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            container: None,
            elements: Vec::new(),
            min_major_version: None,
            chunk_size: None,
        }
    }

    pub fn with_container(mut self, container: QName) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = QName>) -> Self {
        self.elements.extend(elements);
        self
    }

    pub fn requires_major(mut self, major: u8) -> Self {
        self.min_major_version = Some(major);
        self
    }

    pub fn chunked(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    pub fn request_name(&self) -> QName {
        QName::new(MNS, self.name)
    }

    pub fn response_name(&self) -> QName {
        QName::owned(Some(MNS), format!("{}Response", self.name))
    }

    pub fn message_name(&self) -> QName {
        QName::owned(Some(MNS), format!("{}ResponseMessage", self.name))
    }

    /// True if `element` is one of this operation's result elements.
    pub fn is_result(&self, element: &Element) -> bool {
        self.elements.is_empty() || self.elements.iter().any(|name| element.is(name))
    }

    /// Result elements of `container`, in document order.
    pub fn extract(&self, container: Element) -> Vec<Element> {
        container
            .children
            .into_iter()
            .filter(|child| self.is_result(child))
            .collect()
    }
}
