/// Errors that can occur while building or validating an event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A required core attribute is absent or empty.
    #[error("missing required attribute: {attribute}")]
    MissingRequiredAttribute { attribute: &'static str },

    /// A core attribute value could not be parsed (URI, timestamp, ...).
    #[error("invalid value for attribute {attribute}: {reason}")]
    InvalidAttributeValue {
        attribute: &'static str,
        reason: String,
    },

    /// The spec version string does not name a supported revision.
    #[error("unknown spec version: {0:?}")]
    UnknownSpecVersion(String),

    /// An extension attribute name collides with a reserved core name.
    #[error("extension name {0:?} is reserved by the envelope version")]
    ReservedExtensionName(String),
}

pub type Result<T> = std::result::Result<T, EventError>;
