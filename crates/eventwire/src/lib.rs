//! Event interchange between producers and consumers that may speak
//! different envelope versions and encodings.
//!
//! eventwire models an event as a version-polymorphic envelope, encodes it
//! in binary or structured form, and carries it over pluggable transport
//! bindings with a uniform end-of-stream contract.
//!
//! # Crate Structure
//!
//! - [`event`] — The envelope: per-version context attributes and extensions
//! - [`codec`] — Binary and structured wire codecs plus the encoding selector
//! - [`binding`] — Transport bindings (channel, byte stream) and the
//!   receive-and-decode loop

/// Re-export envelope types.
pub mod event {
    pub use eventwire_event::*;
}

/// Re-export codec types.
pub mod codec {
    pub use eventwire_codec::*;
}

/// Re-export binding types.
pub mod binding {
    pub use eventwire_binding::*;
}
