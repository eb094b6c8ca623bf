use std::collections::HashMap;

use crate::error::{Result, ServiceError};

/// Response code reported for a successful item.
pub const NO_ERROR: &str = "NoError";

/// Response code reported when the server stops processing the rest of a batch.
pub const BATCH_PROCESSING_STOPPED: &str = "ErrorBatchProcessingStopped";

/// How a recognized response code propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Routine remote condition. Propagated without diagnostic capture.
    Expected,
    /// Anything else the server can report about a request.
    Fatal,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Expected => "expected",
            Disposition::Fatal => "fatal",
        }
    }
}

const EXPECTED_CODES: &[&str] = &[
    "ErrorAccessDenied",
    BATCH_PROCESSING_STOPPED,
    "ErrorCannotDeleteObject",
    "ErrorConnectionFailed",
    "ErrorCreateItemAccessDenied",
    "ErrorFolderNotFound",
    "ErrorImpersonateUserDenied",
    "ErrorImpersonationFailed",
    "ErrorInternalServerError",
    "ErrorInternalServerTransientError",
    "ErrorInvalidLicense",
    "ErrorMailboxMoveInProgress",
    "ErrorMailboxStoreUnavailable",
    "ErrorNoRespondingCASInDestinationSite",
    "ErrorNonExistentMailbox",
    "ErrorQuotaExceeded",
    "ErrorServerBusy",
    "ErrorTimeoutExpired",
    "ErrorTooManyObjectsOpened",
    "RateLimitError",
];

const FATAL_CODES: &[&str] = &[
    "ErrorAccountDisabled",
    "ErrorAffectedTaskOccurrencesRequired",
    "ErrorCalendarCannotMoveOrCopyOccurrence",
    "ErrorCannotEmptyFolder",
    "ErrorChangeKeyRequired",
    "ErrorChangeKeyRequiredForWriteOperations",
    "ErrorCorruptData",
    "ErrorCrossMailboxMoveCopy",
    "ErrorDeleteDistinguishedFolder",
    "ErrorDuplicateInputFolderNames",
    "ErrorEmptyAggregatedAttachment",
    "ErrorExceededConnectionCount",
    "ErrorFolderExists",
    "ErrorFolderSave",
    "ErrorFolderSaveFailed",
    "ErrorIncorrectSchemaVersion",
    "ErrorIncorrectUpdatePropertyCount",
    "ErrorInvalidChangeKey",
    "ErrorInvalidExchangeImpersonationHeaderData",
    "ErrorInvalidFolderId",
    "ErrorInvalidIdMalformed",
    "ErrorInvalidIdNotAnItemAttachmentId",
    "ErrorInvalidOperation",
    "ErrorInvalidPropertyRequest",
    "ErrorInvalidPropertySet",
    "ErrorInvalidRequest",
    "ErrorInvalidRestriction",
    "ErrorInvalidSchemaVersionForMailboxVersion",
    "ErrorInvalidServerVersion",
    "ErrorInvalidSmtpAddress",
    "ErrorInvalidSubscription",
    "ErrorInvalidValueForProperty",
    "ErrorIrresolvableConflict",
    "ErrorItemCorrupt",
    "ErrorItemNotFound",
    "ErrorItemSave",
    "ErrorMailRecipientNotFound",
    "ErrorMessageSizeExceeded",
    "ErrorMimeContentConversionFailed",
    "ErrorMoveCopyFailed",
    "ErrorNameResolutionMultipleResults",
    "ErrorNameResolutionNoResults",
    "ErrorNoPropertyTagForCustomProperties",
    "ErrorNotDelegate",
    "ErrorObjectTypeChanged",
    "ErrorParentFolderNotFound",
    "ErrorPropertyUpdate",
    "ErrorReadEventsFailed",
    "ErrorSchemaValidation",
    "ErrorSendAsDenied",
    "ErrorSentMeetingRequestUpdate",
    "ErrorStaleObject",
    "ErrorTimeZone",
    "ErrorUnsupportedPathForQuery",
    "ErrorUnsupportedPropertyDefinition",
    "ErrorUpdatePropertyMismatch",
];

/// Open mapping from response code strings to their [`Disposition`].
///
/// Codes the registry has never seen are not an error condition of the
/// registry itself; they classify as [`ServiceError::UnknownCode`] and keep
/// the raw diagnostics.
#[derive(Debug, Clone)]
pub struct CodeRegistry {
    codes: HashMap<String, Disposition>,
}

impl CodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Create a registry holding the service family's known vocabulary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for code in EXPECTED_CODES {
            registry.register(*code, Disposition::Expected);
        }
        for code in FATAL_CODES {
            registry.register(*code, Disposition::Fatal);
        }
        registry
    }

    /// Register or override a code. Returns the previous disposition, if any.
    pub fn register(
        &mut self,
        code: impl Into<String>,
        disposition: Disposition,
    ) -> Option<Disposition> {
        self.codes.insert(code.into(), disposition)
    }

    /// Disposition for `code`, ignoring any namespace prefix.
    pub fn disposition(&self, code: &str) -> Option<Disposition> {
        self.codes.get(strip_prefix(code)).copied()
    }

    /// True if `code` is registered.
    pub fn contains(&self, code: &str) -> bool {
        self.disposition(code).is_some()
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if no codes are registered.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Registered codes sorted by name.
    pub fn entries(&self) -> Vec<(&str, Disposition)> {
        let mut entries: Vec<_> = self
            .codes
            .iter()
            .map(|(code, disposition)| (code.as_str(), *disposition))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Build the error for a non-success `code`.
    pub fn classify(&self, code: &str, text: &str, xml: &str) -> ServiceError {
        let bare = strip_prefix(code);
        match self.codes.get(bare) {
            Some(disposition) => ServiceError::Response {
                code: bare.to_string(),
                message: text.to_string(),
                expected: *disposition == Disposition::Expected,
            },
            None => ServiceError::UnknownCode {
                code: code.to_string(),
                text: text.to_string(),
                xml: xml.to_string(),
            },
        }
    }

    /// Check a per-message response code.
    ///
    /// `NoError` passes. An empty or absent code means the response is
    /// malformed. Anything else is classified.
    pub fn check_response_code(&self, code: Option<&str>, text: &str, xml: &str) -> Result<()> {
        match code.map(str::trim) {
            Some(NO_ERROR) => Ok(()),
            None | Some("") => Err(ServiceError::Protocol(format!(
                "empty ResponseCode in ResponseMessage (MessageText: {text}, MessageXml: {xml})"
            ))),
            Some(code) => Err(self.classify(code, text, xml)),
        }
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strip_prefix(code: &str) -> &str {
    code.rsplit_once(':').map_or(code, |(_, local)| local)
}
