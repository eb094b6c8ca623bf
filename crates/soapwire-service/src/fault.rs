use std::fmt;

use soapwire_envelope::{to_xml, Element, QName, ENS};

use crate::codes::CodeRegistry;
use crate::error::ServiceError;

const FAULTCODE: QName = QName::unqualified("faultcode");
const FAULTSTRING: QName = QName::unqualified("faultstring");
const FAULTACTOR: QName = QName::unqualified("faultactor");
const DETAIL: QName = QName::unqualified("detail");
const DETAIL_RESPONSE_CODE: QName = QName::new(ENS, "ResponseCode");
const DETAIL_MESSAGE: QName = QName::new(ENS, "Message");

/// Structured `detail` of a SOAP fault.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultDetail {
    pub response_code: Option<String>,
    pub message: Option<String>,
    /// Serialized `detail` element, for diagnostics.
    pub raw: Option<String>,
}

/// A SOAP-level failure not tied to any single item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fault {
    pub code: Option<String>,
    pub string: Option<String>,
    pub actor: Option<String>,
    pub detail: Option<FaultDetail>,
}

impl Fault {
    /// Read a fault from its `Fault` element.
    pub fn from_element(fault: &Element) -> Self {
        let detail = fault.find(&DETAIL).map(|detail| FaultDetail {
            response_code: detail.child_text(&DETAIL_RESPONSE_CODE).map(str::to_string),
            message: detail.child_text(&DETAIL_MESSAGE).map(str::to_string),
            raw: to_xml(detail).ok(),
        });

        Self {
            code: fault.child_text(&FAULTCODE).map(str::to_string),
            string: fault.child_text(&FAULTSTRING).map(str::to_string),
            actor: fault.child_text(&FAULTACTOR).map(str::to_string),
            detail,
        }
    }

    /// Turn the fault into the error it represents.
    ///
    /// A response code in the detail wins over the fault code. A code the
    /// registry does not know falls through, and a fault with no known code
    /// stays a raw [`ServiceError::Fault`].
    pub fn classify(self, registry: &CodeRegistry) -> ServiceError {
        if let Some(detail) = &self.detail {
            if let Some(code) = detail.response_code.as_deref() {
                if registry.contains(code) {
                    let message = detail.message.as_deref().unwrap_or_default();
                    return registry.classify(code, message, "");
                }
            }
        }

        if let Some(code) = self.code.as_deref() {
            if registry.contains(code) {
                let message = self.string.as_deref().unwrap_or_default();
                return registry.classify(code, message, "");
            }
        }

        ServiceError::Fault(self)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "code: {} string: {} actor: {}",
            field(&self.code),
            field(&self.string),
            field(&self.actor)
        )?;
        if let Some(detail) = &self.detail {
            write!(
                f,
                " detail: code: {} msg: {}",
                field(&detail.response_code),
                field(&detail.message)
            )?;
        }
        Ok(())
    }
}
