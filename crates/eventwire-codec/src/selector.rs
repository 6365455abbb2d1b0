//! Encoding-mode and version selection for inbound messages.
//!
//! Selection never guesses: a message that carries neither a structured
//! content type nor a spec-version metadata entry fails closed with
//! `UnknownEncoding`.

use eventwire_event::{Event, SpecVersion};
use serde_json::Value;

use crate::binary;
use crate::error::{CodecError, Result};
use crate::message::{Message, STRUCTURED_CONTENT_TYPE_PREFIX};
use crate::structured;

/// The two wire encoding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Attributes as transport metadata, payload as the body.
    Binary,
    /// One self-describing envelope document.
    Structured,
}

/// Metadata keys that may declare the spec version in binary mode,
/// across all supported revisions.
const VERSION_HEADERS: [&str; 2] = ["ce-specversion", "ce-cloudeventsversion"];

/// Envelope fields that may declare the spec version in structured mode.
const VERSION_FIELDS: [&str; 2] = ["specversion", "cloudeventsversion"];

/// Determine the codec (version + mode) for an inbound message.
pub fn select(message: &Message) -> Result<(SpecVersion, Encoding)> {
    match message {
        Message::Structured { content_type, body } => {
            require_json_format(content_type)?;
            Ok((version_from_envelope(body)?, Encoding::Structured))
        }
        Message::Binary { headers, body } => {
            if let Some(content_type) = headers.first(crate::message::CONTENT_TYPE_HEADER) {
                if media_type(content_type).starts_with(STRUCTURED_CONTENT_TYPE_PREFIX) {
                    require_json_format(content_type)?;
                    return Ok((version_from_envelope(body)?, Encoding::Structured));
                }
            }
            for key in VERSION_HEADERS {
                if let Some(value) = headers.first(key) {
                    return Ok((SpecVersion::parse(value)?, Encoding::Binary));
                }
            }
            Err(CodecError::UnknownEncoding(
                "no structured content type and no spec version metadata".to_string(),
            ))
        }
    }
}

/// Select the codec for a message and decode it.
pub fn decode(message: &Message) -> Result<Event> {
    let (version, encoding) = select(message)?;
    tracing::debug!(version = %version, ?encoding, "selected codec for inbound message");

    match (message, encoding) {
        (Message::Binary { headers, body }, Encoding::Binary) => {
            binary::decode(version, headers, body)
        }
        (Message::Binary { body, .. }, Encoding::Structured)
        | (Message::Structured { body, .. }, Encoding::Structured) => {
            structured::decode(version, body)
        }
        // select() never pairs a structured-shaped message with the
        // binary mode; fail closed rather than guess.
        (Message::Structured { .. }, Encoding::Binary) => Err(CodecError::UnknownEncoding(
            "structured message cannot carry a binary encoding".to_string(),
        )),
    }
}

fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

fn require_json_format(content_type: &str) -> Result<()> {
    let media = media_type(content_type);
    match media.strip_prefix(STRUCTURED_CONTENT_TYPE_PREFIX) {
        Some("json") => Ok(()),
        Some(format) => Err(CodecError::UnknownEncoding(format!(
            "unsupported structured format {format:?}"
        ))),
        None => Err(CodecError::UnknownEncoding(format!(
            "not a structured content type: {media:?}"
        ))),
    }
}

fn version_from_envelope(body: &[u8]) -> Result<SpecVersion> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| CodecError::MalformedPayload(err.to_string()))?;
    let Value::Object(envelope) = value else {
        return Err(CodecError::MalformedPayload(
            "envelope is not a JSON object".to_string(),
        ));
    };
    for field in VERSION_FIELDS {
        if let Some(Value::String(version)) = envelope.get(field) {
            return Ok(SpecVersion::parse(version)?);
        }
    }
    Err(CodecError::UnknownEncoding(
        "envelope declares no spec version".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use eventwire_event::{ContextAttributes, EventError};
    use serde_json::json;

    use crate::headers::Headers;
    use crate::message::STRUCTURED_CONTENT_TYPE;

    use super::*;

    fn structured_body(version: &str) -> Bytes {
        Bytes::from(
            serde_json::to_vec(&json!({
                "specversion": version,
                "id": "ABC-123",
                "type": "com.example.test",
                "source": "http://example.com/source",
            }))
            .unwrap(),
        )
    }

    #[test]
    fn structured_content_type_selects_structured_mode() {
        let message = Message::structured(STRUCTURED_CONTENT_TYPE, structured_body("0.2"));
        assert_eq!(
            select(&message).unwrap(),
            (SpecVersion::V0_2, Encoding::Structured)
        );

        let event = decode(&message).unwrap();
        assert_eq!(event.context.spec_version(), SpecVersion::V0_2);
    }

    #[test]
    fn binary_shape_with_structured_content_type_selects_structured_mode() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", STRUCTURED_CONTENT_TYPE);
        let message = Message::binary(headers, structured_body("1.0"));

        assert_eq!(
            select(&message).unwrap(),
            (SpecVersion::V1_0, Encoding::Structured)
        );
    }

    #[test]
    fn version_header_selects_binary_mode() {
        let headers: Headers = [
            ("ce-specversion", "0.2"),
            ("ce-id", "ABC-123"),
            ("ce-type", "com.example.test"),
            ("ce-source", "http://example.com/source"),
        ]
        .into_iter()
        .collect();
        let message = Message::binary(headers, Bytes::new());

        assert_eq!(
            select(&message).unwrap(),
            (SpecVersion::V0_2, Encoding::Binary)
        );
        assert_eq!(decode(&message).unwrap().context.id(), "ABC-123");
    }

    #[test]
    fn v01_version_header_selects_binary_mode() {
        let headers: Headers = [("ce-cloudeventsversion", "0.1")].into_iter().collect();
        let message = Message::binary(headers, Bytes::new());

        assert_eq!(
            select(&message).unwrap(),
            (SpecVersion::V0_1, Encoding::Binary)
        );
    }

    #[test]
    fn no_hints_is_unknown_encoding() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        let message = Message::binary(headers, Bytes::from_static(b"{}"));

        assert!(matches!(
            select(&message).unwrap_err(),
            CodecError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn unknown_version_string_fails_closed() {
        let headers: Headers = [("ce-specversion", "9.9")].into_iter().collect();
        let message = Message::binary(headers, Bytes::new());

        assert!(matches!(
            select(&message).unwrap_err(),
            CodecError::Event(EventError::UnknownSpecVersion(_))
        ));
    }

    #[test]
    fn non_json_structured_format_is_unknown_encoding() {
        let message = Message::structured("application/cloudevents+avro", structured_body("0.2"));
        assert!(matches!(
            select(&message).unwrap_err(),
            CodecError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn structured_envelope_without_version_is_unknown_encoding() {
        let body = Bytes::from(serde_json::to_vec(&json!({"id": "ABC-123"})).unwrap());
        let message = Message::structured(STRUCTURED_CONTENT_TYPE, body);
        assert!(matches!(
            select(&message).unwrap_err(),
            CodecError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn content_type_parameters_are_tolerated() {
        let message = Message::structured(
            "application/cloudevents+json; charset=utf-8",
            structured_body("0.3"),
        );
        assert_eq!(
            select(&message).unwrap(),
            (SpecVersion::V0_3, Encoding::Structured)
        );
    }
}
