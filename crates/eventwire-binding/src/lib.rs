//! Transport bindings for eventwire messages.
//!
//! Defines the [`Sender`]/[`Receiver`] traits that carry [`Message`]s over
//! a transport, plus two concrete bindings:
//! - an in-process bounded channel
//! - a framed byte-stream adapter over any `Read`/`Write` pair
//!
//! Every receiver reports closure the same way: a `Received::EndOfStream`
//! value, never a transport-specific error. Cancellation is observed
//! through a shared [`CancelToken`] and surfaces as `EndOfStream` too.
//!
//! [`Message`]: eventwire_codec::Message

pub mod cancel;
pub mod channel;
pub mod consume;
pub mod error;
pub mod stream;
pub mod traits;

pub use cancel::CancelToken;
pub use channel::{channel, channel_with_capacity, ChannelReceiver, ChannelSender};
pub use consume::{receive_events, DecodePolicy};
pub use error::{ConsumeError, Result, TransportError};
pub use stream::{StreamConfig, StreamReceiver, StreamSender};
pub use traits::{Received, Receiver, Sender};
