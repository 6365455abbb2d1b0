use eventwire_event::{ContextAttributes, Event, SpecVersion};

use crate::binary;
use crate::error::{CodecError, Result};
use crate::message::Message;
use crate::selector::{self, Encoding};
use crate::structured;

/// A stateless codec pinned to one spec version and encoding mode.
///
/// Configuration-only: safe to share and invoke concurrently. Events in a
/// different context version are re-targeted through the capability
/// surface before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    version: SpecVersion,
    encoding: Encoding,
}

impl Codec {
    pub fn new(version: SpecVersion, encoding: Encoding) -> Self {
        Self { version, encoding }
    }

    /// Binary-mode codec for a version.
    pub fn binary(version: SpecVersion) -> Self {
        Self::new(version, Encoding::Binary)
    }

    /// Structured-mode codec for a version.
    pub fn structured(version: SpecVersion) -> Self {
        Self::new(version, Encoding::Structured)
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encode an event in this codec's version and mode.
    pub fn encode(&self, event: &Event) -> Result<Message> {
        let retargeted;
        let event = if event.context.spec_version() == self.version {
            event
        } else {
            let context = event.context.to_version(self.version)?;
            let mut rebuilt = Event::new(context);
            if let Some(data) = event.data() {
                rebuilt = rebuilt.with_data(data.clone());
            }
            retargeted = rebuilt;
            &retargeted
        };

        match self.encoding {
            Encoding::Binary => binary::encode(event),
            Encoding::Structured => structured::encode(event),
        }
    }

    /// Decode a message, requiring it to match this codec's version.
    ///
    /// Version-agnostic consumption should use [`selector::decode`]
    /// instead; this pinned form exists for callers that reject foreign
    /// revisions over a given channel.
    pub fn decode(&self, message: &Message) -> Result<Event> {
        let (version, _) = selector::select(message)?;
        if version != self.version {
            return Err(CodecError::UnknownEncoding(format!(
                "message declares version {version}, codec is pinned to {}",
                self.version
            )));
        }
        selector::decode(message)
    }
}

#[cfg(test)]
mod tests {
    use eventwire_event::ContextV02;
    use serde_json::json;
    use url::Url;

    use super::*;

    fn event_v02() -> Event {
        Event::new(ContextV02::new(
            "ABC-123",
            Url::parse("http://example.com/source").unwrap(),
            "com.example.test",
        ))
        .with_json_data(&json!({"hello": "world"}))
    }

    #[test]
    fn pinned_codec_round_trips() {
        for codec in [
            Codec::binary(SpecVersion::V0_2),
            Codec::structured(SpecVersion::V0_2),
        ] {
            let message = codec.encode(&event_v02()).unwrap();
            let decoded = codec.decode(&message).unwrap();
            assert_eq!(decoded.context.id(), "ABC-123");
            assert_eq!(decoded.data().unwrap().as_ref(), br#"{"hello":"world"}"#);
        }
    }

    #[test]
    fn encode_retargets_foreign_context_versions() {
        let codec = Codec::binary(SpecVersion::V1_0);
        let message = codec.encode(&event_v02()).unwrap();

        let Message::Binary { headers, .. } = &message else {
            panic!("binary codec must produce a binary message");
        };
        assert_eq!(headers.first("ce-specversion"), Some("1.0"));
    }

    #[test]
    fn pinned_decode_rejects_other_versions() {
        let message = Codec::binary(SpecVersion::V0_2)
            .encode(&event_v02())
            .unwrap();
        let err = Codec::binary(SpecVersion::V1_0).decode(&message).unwrap_err();
        assert!(matches!(err, CodecError::UnknownEncoding(_)));
    }
}
