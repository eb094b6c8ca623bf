use std::fmt;
use std::sync::Arc;

use soapwire_transport::Transport;

use crate::codes::CodeRegistry;
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::version::ServerVersion;

/// Mailbox a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub primary_smtp_address: String,
}

impl Account {
    pub fn new(primary_smtp_address: impl Into<String>) -> Self {
        Self {
            primary_smtp_address: primary_smtp_address.into(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary_smtp_address)
    }
}

/// Everything a request needs besides its payload.
///
/// Holds no per-call state. Cloning shares the transport and code registry.
#[derive(Clone)]
pub struct Service {
    transport: Arc<dyn Transport>,
    version: ServerVersion,
    codes: Arc<CodeRegistry>,
    config: ServiceConfig,
    account: Option<Account>,
}

impl Service {
    /// Create a service with the builtin code registry and default config.
    pub fn new(transport: Arc<dyn Transport>, version: ServerVersion) -> Self {
        Self {
            transport,
            version,
            codes: Arc::new(CodeRegistry::builtin()),
            config: ServiceConfig::default(),
            account: None,
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_codes(mut self, codes: CodeRegistry) -> Self {
        self.codes = Arc::new(codes);
        self
    }

    /// Impersonate `account` on every request.
    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    /// A copy of this service acting for `account`.
    pub fn for_account(&self, account: Account) -> Self {
        self.clone().with_account(account)
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn version(&self) -> &ServerVersion {
        &self.version
    }

    pub fn codes(&self) -> &CodeRegistry {
        &self.codes
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// Account address for diagnostics, `-` when not impersonating.
    pub fn account_label(&self) -> &str {
        self.account
            .as_ref()
            .map_or("-", |account| account.primary_smtp_address.as_str())
    }

    /// Fail unless the server is at least major version `major`.
    pub fn require_version(&self, major: u8, operation: &'static str) -> Result<()> {
        if self.version.supports(major) {
            return Ok(());
        }
        Err(ServiceError::Unsupported {
            operation,
            required: major,
            actual: self.version.major,
        })
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("endpoint", &self.endpoint())
            .field("version", &self.version)
            .field("codes", &self.codes.len())
            .field("config", &self.config)
            .field("account", &self.account)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use soapwire_transport::ReplayTransport;

    use super::*;

    #[test]
    fn require_version_fails_on_older_server() {
        let service = Service::new(
            Arc::new(ReplayTransport::new("mem://svc")),
            ServerVersion::V2007_SP1,
        );
        let err = service.require_version(14, "GetServerTimeZones").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unsupported { operation: "GetServerTimeZones", required: 14, actual: 8 }
        ));
        assert!(service.require_version(8, "GetFolder").is_ok());
    }

    #[test]
    fn for_account_shares_transport() {
        let transport = Arc::new(ReplayTransport::new("mem://svc"));
        let service = Service::new(transport, ServerVersion::V2010);
        assert_eq!(service.account_label(), "-");

        let scoped = service.for_account(Account::new("alice@example.com"));
        assert_eq!(scoped.account_label(), "alice@example.com");
        assert_eq!(scoped.endpoint(), "mem://svc");
        assert!(service.account().is_none());
    }
}
