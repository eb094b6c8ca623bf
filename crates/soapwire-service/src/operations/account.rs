use soapwire_envelope::{Element, QName};

use crate::dispatcher::Dispatcher;
use crate::error::{Result, ServiceError};
use crate::message::Outcome;
use crate::operation::Operation;
use crate::service::Service;

use super::types::bool_attr;

/// A server time zone definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZone {
    pub id: String,
    pub name: String,
}

/// List the time zones the server knows. Requires a 2010 or later server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetServerTimeZones {
    pub return_full_timezone_data: bool,
}

impl GetServerTimeZones {
    pub const NAME: &'static str = "GetServerTimeZones";

    pub fn operation() -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("TimeZoneDefinitions"))
            .with_elements([QName::types("TimeZoneDefinition")])
            .requires_major(14)
    }

    pub fn payload(&self) -> Element {
        Element::new(QName::messages(Self::NAME)).with_attr(
            "ReturnFullTimeZoneData",
            bool_attr(self.return_full_timezone_data),
        )
    }

    pub fn call(&self, service: &Service) -> Result<Vec<TimeZone>> {
        let operation = Self::operation();
        let outcomes = Dispatcher::new(service, &operation).dispatch(&self.payload())?;
        Ok(outcomes
            .iter()
            .filter_map(Outcome::item)
            .map(|definition| TimeZone {
                id: definition.attr("Id").unwrap_or_default().to_string(),
                name: definition.attr("Name").unwrap_or_default().to_string(),
            })
            .collect())
    }
}

/// Resolve ambiguous names against the directory and contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveNames {
    pub entries: Vec<String>,
    pub return_full_contact_data: bool,
}

impl ResolveNames {
    pub const NAME: &'static str = "ResolveNames";

    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            return_full_contact_data: false,
        }
    }

    pub fn with_full_contact_data(mut self, full: bool) -> Self {
        self.return_full_contact_data = full;
        self
    }

    pub fn operation() -> Operation {
        Operation::new(Self::NAME)
            .with_container(QName::messages("ResolutionSet"))
            .with_elements([QName::types("Resolution")])
    }

    pub fn payload(&self) -> Result<Element> {
        if self.entries.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "ResolveNames needs at least one unresolved entry".into(),
            ));
        }
        let mut payload = Element::new(QName::messages(Self::NAME)).with_attr(
            "ReturnFullContactData",
            bool_attr(self.return_full_contact_data),
        );
        for entry in &self.entries {
            payload.push(Element::new(QName::messages("UnresolvedEntry")).with_text(entry.clone()));
        }
        Ok(payload)
    }

    /// One outcome per `Resolution`.
    pub fn call(&self, service: &Service) -> Result<Vec<Outcome>> {
        let operation = Self::operation();
        let payload = self.payload()?;
        Dispatcher::new(service, &operation).dispatch(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{message, response, service_for, service_with_version};
    use crate::version::ServerVersion;

    #[test]
    fn time_zones_are_id_name_pairs() {
        let definitions = r#"<m:TimeZoneDefinitions>
            <t:TimeZoneDefinition Id="UTC" Name="(UTC) Coordinated Universal Time"/>
            <t:TimeZoneDefinition Id="W. Europe Standard Time" Name="(UTC+01:00) Amsterdam"/>
        </m:TimeZoneDefinitions>"#;
        let (service, transport) = service_for(vec![response(
            "GetServerTimeZones",
            &[message("GetServerTimeZones", "Success", "NoError", definitions)],
        )]);

        let zones = GetServerTimeZones::default().call(&service).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, "UTC");
        assert_eq!(zones[1].name, "(UTC+01:00) Amsterdam");

        let sent = String::from_utf8(transport.sent()[0].to_vec()).unwrap();
        assert!(sent.contains(r#"ReturnFullTimeZoneData="false""#));
    }

    #[test]
    fn time_zones_are_gated_before_any_request() {
        let (service, transport) = service_with_version(Vec::new(), ServerVersion::V2007_SP1);
        let err = GetServerTimeZones::default().call(&service).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unsupported { operation: "GetServerTimeZones", required: 14, actual: 8 }
        ));
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn resolve_names_writes_one_entry_per_name() {
        let payload = ResolveNames::new(vec!["alice".into(), "bob".into()])
            .with_full_contact_data(true)
            .payload()
            .unwrap();
        assert_eq!(payload.attr("ReturnFullContactData"), Some("true"));
        let entries: Vec<_> = payload
            .find_all(&QName::messages("UnresolvedEntry"))
            .filter_map(Element::text)
            .collect();
        assert_eq!(entries, vec!["alice", "bob"]);
    }

    #[test]
    fn resolve_names_requires_entries() {
        let (service, transport) = service_for(Vec::new());
        let err = ResolveNames::new(Vec::new()).call(&service).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn resolve_names_returns_resolutions() {
        let set = "<m:ResolutionSet><t:Resolution><t:Mailbox/></t:Resolution></m:ResolutionSet>";
        let (service, _) = service_for(vec![response(
            "ResolveNames",
            &[message("ResolveNames", "Success", "NoError", set)],
        )]);
        let outcomes = ResolveNames::new(vec!["alice".into()]).call(&service).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].item().is_some());
    }
}
