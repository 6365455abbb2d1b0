//! Version-polymorphic event envelope model.
//!
//! An [`Event`] is a versioned context (the envelope of core attributes)
//! plus an optional opaque payload. Four envelope revisions are supported
//! behind one capability surface; version differences in attribute naming
//! and placement are fully encapsulated in the per-version context types.
//!
//! Pure data, no I/O. Encoding to and from wire messages lives in
//! `eventwire-codec`.

pub mod context;
pub mod error;
pub mod event;
pub mod extension;
pub mod v01;
pub mod v02;
pub mod v03;
pub mod v10;

pub use context::{AttributeNames, ContextAttributes, EventContext, SpecVersion};
pub use error::{EventError, Result};
pub use event::Event;
pub use extension::ExtensionValue;
pub use v01::ContextV01;
pub use v02::ContextV02;
pub use v03::ContextV03;
pub use v10::ContextV10;
