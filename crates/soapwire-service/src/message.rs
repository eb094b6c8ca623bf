use soapwire_envelope::{to_xml, Element, QName};

const RESPONSE_CODE: QName = QName::messages("ResponseCode");
const MESSAGE_TEXT: QName = QName::messages("MessageText");
const MESSAGE_XML: QName = QName::messages("MessageXml");

/// `ResponseClass` attribute of a response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

impl ResponseClass {
    /// Parse the attribute value. Anything unrecognized counts as `Error`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Success") => ResponseClass::Success,
            Some("Warning") => ResponseClass::Warning,
            _ => ResponseClass::Error,
        }
    }
}

/// Per-item outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The item succeeded and the operation returns no result elements.
    Success,
    /// One extracted result element.
    Item(Element),
    /// The item succeeded but the server attached a warning message.
    ///
    /// Only produced for operations without result elements; when a warning
    /// response carries results they are returned as [`Outcome::Item`] and the
    /// message is logged.
    Notice(String),
    /// The server stopped before processing this item.
    Warning(String),
}

impl Outcome {
    /// False only for soft warnings.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Warning(_))
    }

    pub fn item(&self) -> Option<&Element> {
        match self {
            Outcome::Item(element) => Some(element),
            _ => None,
        }
    }

    pub fn into_item(self) -> Option<Element> {
        match self {
            Outcome::Item(element) => Some(element),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            Outcome::Notice(message) => Some(message),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Outcome::Warning(message) => Some(message),
            _ => None,
        }
    }
}

/// One `{op}ResponseMessage`, split into its status fields and the rest.
#[derive(Debug, Clone)]
pub(crate) struct ResponseMessage {
    pub class: ResponseClass,
    pub code: Option<String>,
    pub text: String,
    pub xml: String,
    pub element: Element,
}

impl ResponseMessage {
    pub fn from_element(element: Element) -> Self {
        let class = ResponseClass::parse(element.attr("ResponseClass"));
        let code = element.child_text(&RESPONSE_CODE).map(str::to_string);
        let text = element
            .child_text(&MESSAGE_TEXT)
            .unwrap_or_default()
            .to_string();
        let xml = element
            .find(&MESSAGE_XML)
            .map(|xml| {
                xml.children
                    .iter()
                    .filter_map(|child| to_xml(child).ok())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Self {
            class,
            code,
            text,
            xml,
            element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_response_class_is_error() {
        assert_eq!(ResponseClass::parse(Some("Success")), ResponseClass::Success);
        assert_eq!(ResponseClass::parse(Some("Warning")), ResponseClass::Warning);
        assert_eq!(ResponseClass::parse(Some("success")), ResponseClass::Error);
        assert_eq!(ResponseClass::parse(None), ResponseClass::Error);
    }

    #[test]
    fn reads_status_fields() {
        let element = Element::new(QName::messages("GetItemResponseMessage"))
            .with_attr("ResponseClass", "Error")
            .with_child(Element::new(MESSAGE_TEXT).with_text("not found"))
            .with_child(Element::new(RESPONSE_CODE).with_text("ErrorItemNotFound"))
            .with_child(
                Element::new(MESSAGE_XML)
                    .with_child(Element::new(QName::types("Value")).with_attr("Name", "x")),
            );

        let message = ResponseMessage::from_element(element);
        assert_eq!(message.class, ResponseClass::Error);
        assert_eq!(message.code.as_deref(), Some("ErrorItemNotFound"));
        assert_eq!(message.text, "not found");
        assert!(message.xml.contains("Value"));
    }

    #[test]
    fn outcome_accessors() {
        let item = Outcome::Item(Element::new(QName::types("Message")));
        assert!(item.is_success());
        assert!(item.item().is_some());
        assert!(Outcome::Success.is_success());
        assert_eq!(Outcome::Warning("stopped".into()).warning(), Some("stopped"));
        assert!(!Outcome::Warning("stopped".into()).is_success());
        let notice = Outcome::Notice("name is ambiguous".into());
        assert!(notice.is_success());
        assert_eq!(notice.notice(), Some("name is ambiguous"));
        assert_eq!(notice.warning(), None);
    }
}
