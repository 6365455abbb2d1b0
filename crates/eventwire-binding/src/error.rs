use eventwire_codec::CodecError;

/// Errors a transport adapter may surface through the binding.
///
/// End-of-stream is deliberately *not* an error: adapters report it
/// through [`crate::Received::EndOfStream`] so a clean shutdown never
/// looks like a fault.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport closed in the middle of a message.
    #[error("transport closed mid-message")]
    Closed,

    /// The transport refused to accept the message.
    #[error("send rejected: {0}")]
    Rejected(String),

    /// A received frame violates the wire format.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O fault on the underlying transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors terminating a consumption loop.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("decode error: {0}")]
    Decode(#[from] CodecError),
}
