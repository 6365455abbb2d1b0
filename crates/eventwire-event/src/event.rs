use bytes::Bytes;
use serde_json::Value;

use crate::context::{ContextAttributes, EventContext};
use crate::error::Result;

/// A transport-independent event: versioned envelope plus optional payload.
///
/// Immutable value semantics: codecs construct events, callers own them
/// exclusively; nothing mutates an event behind the caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub context: EventContext,
    data: Option<Bytes>,
}

impl Event {
    pub fn new(context: impl Into<EventContext>) -> Self {
        Self {
            context: context.into(),
            data: None,
        }
    }

    /// Attach raw payload bytes. The declared content type lives on the
    /// context (`data_content_type`).
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach a JSON payload, serialized canonically.
    pub fn with_json_data(mut self, value: &Value) -> Self {
        // Infallible: serde_json::Value always serializes.
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        self.data = Some(Bytes::from(bytes));
        self
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Validate the envelope's invariants.
    pub fn validate(&self) -> Result<()> {
        self.context.validate()
    }
}
