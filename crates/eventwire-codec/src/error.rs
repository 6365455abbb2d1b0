use eventwire_event::EventError;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Envelope-level violation (missing/invalid attribute, unknown version).
    #[error(transparent)]
    Event(#[from] EventError),

    /// The selector could not determine an encoding mode or version.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// The message body is not valid JSON where JSON is required.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The event data cannot be represented in its declared content type.
    #[error("data cannot be represented as {content_type}: {reason}")]
    DataSerialization {
        content_type: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
