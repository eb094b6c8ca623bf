use soapwire_envelope::EnvelopeConfig;

/// Default upper bound on pages fetched by one paged retrieval.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Controls dispatch behavior.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Envelope codec limits applied to every response.
    pub envelope: EnvelopeConfig,
    /// Maximum pages per paged retrieval before giving up with a protocol error.
    pub max_pages: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            envelope: EnvelopeConfig::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}
