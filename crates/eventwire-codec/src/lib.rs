//! Wire codecs for versioned event envelopes.
//!
//! Two encoding modes over one message type:
//! - **binary**: attributes as `Ce-`-prefixed transport metadata, the
//!   event payload as the body;
//! - **structured**: the whole event as one self-describing JSON
//!   envelope (`application/cloudevents+json`).
//!
//! The [`selector`] inspects inbound messages and picks the matching
//! version and mode, failing closed on ambiguous metadata. Codecs are
//! pure and stateless; transports move [`Message`] values through the
//! binding abstraction in `eventwire-binding`.

pub mod binary;
pub mod codec;
pub mod error;
pub mod headers;
pub mod message;
pub mod selector;
pub mod structured;

pub use codec::Codec;
pub use error::{CodecError, Result};
pub use headers::Headers;
pub use message::{
    is_json_content_type, Message, ATTRIBUTE_PREFIX, CONTENT_TYPE_HEADER,
    DEFAULT_DATA_CONTENT_TYPE, STRUCTURED_CONTENT_TYPE, STRUCTURED_CONTENT_TYPE_PREFIX,
};
pub use selector::{decode, select, Encoding};
