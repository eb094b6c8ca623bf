/// Errors that can occur while wrapping or unwrapping envelopes.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The response body is not well-formed XML.
    #[error("response is not well-formed XML: {0}")]
    Malformed(String),

    /// The response declares a character encoding the codec cannot decode.
    #[error("unsupported response encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The response body exceeds the configured maximum size.
    #[error("response too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// Serializing an element tree failed.
    #[error("failed to write XML: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
