use eventwire_codec::Message;

use crate::cancel::CancelToken;
use crate::error::Result;

/// Outcome of a blocking receive call.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    /// A wire message arrived.
    Message(Message),
    /// No further messages will arrive: the peer closed its send side,
    /// the transport tore the session down, or the caller cancelled.
    /// A normal termination signal, never an error.
    EndOfStream,
}

/// Outbound half of a transport binding.
///
/// Concurrent sends from multiple threads are not required to be
/// supported; adapters that need external serialization must say so.
pub trait Sender {
    fn send(&mut self, cancel: &CancelToken, message: Message) -> Result<()>;
}

/// Inbound half of a transport binding.
///
/// `receive` blocks until a message arrives, the token is cancelled, or
/// the transport signals closure. Every adapter must translate its own
/// notion of "no more messages" into [`Received::EndOfStream`] --
/// structurally, never by matching error text -- so one consumption loop
/// works unmodified against any transport. Any other failure surfaces as
/// a [`crate::TransportError`].
pub trait Receiver {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Received>;
}
