use std::fmt;
use std::io;

use soapwire_envelope::EnvelopeError;
use soapwire_service::ServiceError;
use soapwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SERVICE_ERROR: i32 = 2;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::Status { status: 401 | 403, .. } => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn envelope_error(context: &str, err: EnvelopeError) -> CliError {
    match err {
        EnvelopeError::Write(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn service_error(context: &str, err: ServiceError) -> CliError {
    match err {
        ServiceError::Transport(err) => transport_error(context, err),
        ServiceError::Envelope(err) => envelope_error(context, err),
        ServiceError::Protocol(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ServiceError::Response { ref code, .. } if is_permission_code(code) => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        ServiceError::Unsupported { .. } | ServiceError::InvalidRequest(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(SERVICE_ERROR, format!("{context}: {other}")),
    }
}

fn is_permission_code(code: &str) -> bool {
    code.ends_with("AccessDenied") || code == "ErrorImpersonateUserDenied"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_exit_codes() {
        let response = |code: &str| ServiceError::Response {
            code: code.to_string(),
            message: String::new(),
            expected: true,
        };
        assert_eq!(service_error("x", response("ErrorAccessDenied")).code, PERMISSION_DENIED);
        assert_eq!(service_error("x", response("ErrorServerBusy")).code, SERVICE_ERROR);
        assert_eq!(
            service_error("x", ServiceError::Protocol("bad".into())).code,
            DATA_INVALID
        );
        assert_eq!(
            service_error("x", ServiceError::Transport(TransportError::Exhausted(2))).code,
            TRANSPORT_ERROR
        );
        assert_eq!(
            service_error("x", ServiceError::InvalidRequest("no ids".into())).code,
            USAGE
        );
    }

    #[test]
    fn http_auth_failures_are_permission_errors() {
        let err = TransportError::Status {
            endpoint: "https://mail.example.com/EWS/Exchange.asmx".into(),
            status: 401,
            reason: "Unauthorized".into(),
        };
        assert_eq!(transport_error("send", err).code, PERMISSION_DENIED);
    }
}
