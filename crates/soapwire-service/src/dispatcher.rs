use soapwire_envelope::{to_xml, unwrap, wrap, Element, QName};
use tracing::{debug, warn};

use crate::codes::NO_ERROR;
use crate::error::{Result, ServiceError};
use crate::fault::Fault;
use crate::message::{Outcome, ResponseClass, ResponseMessage};
use crate::operation::Operation;
use crate::service::Service;

const BODY: QName = QName::soap("Body");
const FAULT: QName = QName::soap("Fault");
const RESPONSE_MESSAGES: QName = QName::messages("ResponseMessages");

/// What one response message resolved to.
#[derive(Debug)]
pub(crate) enum Evaluated {
    Success,
    Container(Element),
    Notice(String),
    Warning(String),
}

/// Runs the single-request lifecycle of an [`Operation`] against a [`Service`].
///
/// Owns no state beyond the two borrows, so one dispatcher can be shared by
/// every worker of a chunked call.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    service: &'a Service,
    operation: &'a Operation,
}

impl<'a> Dispatcher<'a> {
    pub fn new(service: &'a Service, operation: &'a Operation) -> Self {
        Self { service, operation }
    }

    pub fn service(&self) -> &'a Service {
        self.service
    }

    pub fn operation(&self) -> &'a Operation {
        self.operation
    }

    /// Fail fast if the server is too old for this operation.
    pub fn ensure_supported(&self) -> Result<()> {
        match self.operation.min_major_version {
            Some(major) => self.service.require_version(major, self.operation.name),
            None => Ok(()),
        }
    }

    /// Send `payload` and return one outcome per result, in response order.
    ///
    /// Unexpected failures are logged with endpoint and account before they
    /// propagate.
    pub fn dispatch(&self, payload: &Element) -> Result<Vec<Outcome>> {
        self.ensure_supported()?;
        self.capture(self.send_and_parse(payload))
    }

    /// [`Dispatcher::dispatch`] without version gating or failure capture.
    pub fn send_and_parse(&self, payload: &Element) -> Result<Vec<Outcome>> {
        let messages = self.exchange(payload)?;
        self.outcomes(messages)
    }

    /// Send one request and return the raw `{op}ResponseMessage` elements.
    pub fn exchange(&self, payload: &Element) -> Result<Vec<Element>> {
        let service = self.service;
        let envelope = wrap(
            payload,
            &service.version().api_version,
            service
                .account()
                .map(|account| account.primary_smtp_address.as_str()),
        )?;

        debug!(
            endpoint = %service.endpoint(),
            service = self.operation.name,
            account = %service.account_label(),
            size = envelope.len(),
            "sending request"
        );
        let response = service.transport().send(&envelope)?;
        let root = unwrap(
            &response.body,
            response.encoding.as_deref(),
            &service.config().envelope,
        )?;
        self.response_messages(root)
    }

    /// Locate the response messages in a parsed envelope, raising any fault.
    pub fn response_messages(&self, mut root: Element) -> Result<Vec<Element>> {
        let mut body = root
            .take(&BODY)
            .ok_or_else(|| ServiceError::Protocol("no Body element in SOAP response".into()))?;

        let Some(mut response) = body.take(&self.operation.response_name()) else {
            let fault = body.find(&FAULT).ok_or_else(|| {
                ServiceError::Protocol(format!("unrecognized SOAP response: {}", describe(&body)))
            })?;
            return Err(Fault::from_element(fault).classify(self.service.codes()));
        };

        let messages = response.take(&RESPONSE_MESSAGES).ok_or_else(|| {
            ServiceError::Protocol(format!(
                "no ResponseMessages element in {}",
                self.operation.response_name()
            ))
        })?;

        let name = self.operation.message_name();
        Ok(messages
            .children
            .into_iter()
            .filter(|message| message.is(&name))
            .collect())
    }

    /// Turn response messages into outcomes, stopping at the first error.
    pub fn outcomes(&self, messages: Vec<Element>) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            match self.evaluate(message, self.operation.container.as_ref())? {
                Evaluated::Success => outcomes.push(Outcome::Success),
                Evaluated::Container(container) => outcomes.extend(
                    self.operation
                        .extract(container)
                        .into_iter()
                        .map(Outcome::Item),
                ),
                Evaluated::Notice(text) => outcomes.push(Outcome::Notice(text)),
                Evaluated::Warning(text) => outcomes.push(Outcome::Warning(text)),
            }
        }
        Ok(outcomes)
    }

    /// Classify one response message and pull out `container` on success.
    pub(crate) fn evaluate(&self, message: Element, container: Option<&QName>) -> Result<Evaluated> {
        let ResponseMessage {
            class,
            code,
            text,
            xml,
            mut element,
        } = ResponseMessage::from_element(message);
        let codes = self.service.codes();

        match class {
            ResponseClass::Success if code.as_deref() == Some(NO_ERROR) => match container {
                None => Ok(Evaluated::Success),
                Some(name) => element.take(name).map(Evaluated::Container).ok_or_else(|| {
                    ServiceError::Protocol(format!(
                        "no {name} element in {}",
                        self.operation.message_name()
                    ))
                }),
            },
            ResponseClass::Warning => match codes.check_response_code(code.as_deref(), &text, &xml) {
                Ok(()) => Ok(accept(element, container, text)),
                Err(err) if err.is_batch_stopped() => {
                    let message = if text.is_empty() { err.to_string() } else { text };
                    Ok(Evaluated::Warning(message))
                }
                Err(err @ ServiceError::Protocol(_)) => Err(err),
                Err(err) => {
                    warn!(
                        endpoint = %self.service.endpoint(),
                        service = self.operation.name,
                        account = %self.service.account_label(),
                        error = %err,
                        "accepting warning response as success"
                    );
                    Ok(accept(element, container, text))
                }
            },
            // Error class, or Success with a code other than NoError.
            _ => codes
                .check_response_code(code.as_deref(), &text, &xml)
                .map(|()| Evaluated::Success),
        }
    }

    /// Log unexpected failures with full context, then pass the result through.
    pub(crate) fn capture<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !err.is_routine() {
                warn!(
                    endpoint = %self.service.endpoint(),
                    service = self.operation.name,
                    account = %self.service.account_label(),
                    error = %err,
                    "request failed"
                );
            }
        }
        result
    }
}

fn accept(mut element: Element, container: Option<&QName>, text: String) -> Evaluated {
    match container.and_then(|name| element.take(name)) {
        Some(container) => Evaluated::Container(container),
        None if text.is_empty() => Evaluated::Success,
        None => Evaluated::Notice(text),
    }
}

fn describe(element: &Element) -> String {
    to_xml(element).unwrap_or_else(|_| element.name.to_string())
}
