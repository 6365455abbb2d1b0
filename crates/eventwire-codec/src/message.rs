use bytes::Bytes;

use crate::headers::Headers;

/// Marker prefix for core and extension attributes carried as metadata.
pub const ATTRIBUTE_PREFIX: &str = "Ce-";

/// Transport-native content-type metadata key (not attribute-prefixed).
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Content type of a structured-mode JSON envelope.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Media-type prefix shared by all structured-mode formats.
pub const STRUCTURED_CONTENT_TYPE_PREFIX: &str = "application/cloudevents+";

/// Default payload content type when the event declares none.
pub const DEFAULT_DATA_CONTENT_TYPE: &str = "application/json";

/// A wire-level message in one of the two encoding modes.
///
/// Produced and consumed only by the codec layer; transports move it
/// opaquely through the binding abstraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Attributes as metadata entries, payload as the body.
    Binary { headers: Headers, body: Bytes },
    /// One self-describing envelope document.
    Structured { content_type: String, body: Bytes },
}

impl Message {
    pub fn binary(headers: Headers, body: impl Into<Bytes>) -> Self {
        Message::Binary {
            headers,
            body: body.into(),
        }
    }

    pub fn structured(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Message::Structured {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// The transport-level content type, wherever this shape carries it.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Message::Binary { headers, .. } => headers.first(CONTENT_TYPE_HEADER),
            Message::Structured { content_type, .. } => Some(content_type),
        }
    }

    pub fn body(&self) -> &Bytes {
        match self {
            Message::Binary { body, .. } | Message::Structured { body, .. } => body,
        }
    }
}

/// Whether a declared content type is in the JSON family
/// (`application/json`, `text/json`, any `*+json` suffix).
pub fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    media_type == "application/json" || media_type == "text/json" || media_type.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_family_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/cloudevents+json"));
        assert!(is_json_content_type("text/json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("application/octet-stream"));
    }

    #[test]
    fn content_type_by_shape() {
        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE_HEADER, "application/json");
        let binary = Message::binary(headers, Bytes::new());
        assert_eq!(binary.content_type(), Some("application/json"));

        let structured = Message::structured(STRUCTURED_CONTENT_TYPE, Bytes::new());
        assert_eq!(structured.content_type(), Some(STRUCTURED_CONTENT_TYPE));
    }
}
