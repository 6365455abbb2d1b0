//! Structured encoding mode: the whole event travels as one
//! self-describing JSON envelope.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat};
use eventwire_event::{
    ContextAttributes, Event, EventError, ExtensionValue, SpecVersion,
};
use serde_json::{Map, Value};

use crate::binary::{build_context, parse_url};
use crate::error::{CodecError, Result};
use crate::message::{
    is_json_content_type, Message, DEFAULT_DATA_CONTENT_TYPE, STRUCTURED_CONTENT_TYPE,
};

/// Reserved envelope field carrying the payload.
const DATA_FIELD: &str = "data";

/// Reserved envelope field carrying extensions under revision 0.1.
const EXTENSIONS_FIELD: &str = "extensions";

/// Encode an event as one structured JSON envelope.
///
/// Extension placement is symmetric with [`decode`]: revisions 0.2 and
/// later flatten extensions at the top level, revision 0.1 keeps its
/// historical reserved `extensions` object.
pub fn encode(event: &Event) -> Result<Message> {
    event.validate()?;

    let ctx = &event.context;
    let version = ctx.spec_version();
    let names = version.names();
    let mut envelope = Map::new();

    envelope.insert(
        names.spec_version.to_string(),
        Value::String(version.as_str().to_string()),
    );
    envelope.insert(names.id.to_string(), Value::String(ctx.id().to_string()));
    envelope.insert(
        names.event_type.to_string(),
        Value::String(ctx.event_type().to_string()),
    );
    envelope.insert(
        names.source.to_string(),
        Value::String(ctx.source().to_string()),
    );
    if let Some(time) = ctx.time() {
        envelope.insert(
            names.time.to_string(),
            Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
    }
    if let Some(schema) = ctx.schema() {
        envelope.insert(names.schema.to_string(), Value::String(schema.to_string()));
    }
    if let Some(content_type) = ctx.data_content_type() {
        envelope.insert(
            names.content_type.to_string(),
            Value::String(content_type.to_string()),
        );
    }

    if let Some(bytes) = event.data() {
        let declared = ctx.data_content_type().unwrap_or(DEFAULT_DATA_CONTENT_TYPE);
        let value = if is_json_content_type(declared) {
            serde_json::from_slice(bytes).map_err(|err| CodecError::DataSerialization {
                content_type: declared.to_string(),
                reason: err.to_string(),
            })?
        } else {
            let text =
                std::str::from_utf8(bytes).map_err(|err| CodecError::DataSerialization {
                    content_type: declared.to_string(),
                    reason: err.to_string(),
                })?;
            Value::String(text.to_string())
        };
        envelope.insert(DATA_FIELD.to_string(), value);
    }

    match version {
        SpecVersion::V0_1 => {
            if !ctx.extensions().is_empty() {
                let object: Map<String, Value> = ctx
                    .extensions()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect();
                envelope.insert(EXTENSIONS_FIELD.to_string(), Value::Object(object));
            }
        }
        SpecVersion::V0_2 | SpecVersion::V0_3 | SpecVersion::V1_0 => {
            for (name, value) in ctx.extensions() {
                envelope.insert(name.clone(), value.to_json());
            }
        }
    }

    // A serde_json map always serializes.
    let body = serde_json::to_vec(&Value::Object(envelope)).unwrap_or_default();
    Ok(Message::Structured {
        content_type: STRUCTURED_CONTENT_TYPE.to_string(),
        body: Bytes::from(body),
    })
}

/// Decode a structured JSON envelope for a known spec version.
pub fn decode(version: SpecVersion, body: &Bytes) -> Result<Event> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| CodecError::MalformedPayload(err.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(CodecError::MalformedPayload(
            "envelope is not a JSON object".to_string(),
        ));
    };

    let names = version.names();

    let declared = take_string(&mut envelope, names.spec_version)?.ok_or(
        EventError::MissingRequiredAttribute {
            attribute: names.spec_version,
        },
    )?;
    let declared = SpecVersion::parse(&declared)?;
    if declared != version {
        return Err(EventError::InvalidAttributeValue {
            attribute: names.spec_version,
            reason: format!("declares {declared}, decoding as {version}"),
        }
        .into());
    }

    let id = take_string(&mut envelope, names.id)?
        .ok_or(EventError::MissingRequiredAttribute { attribute: names.id })?;
    let event_type = take_string(&mut envelope, names.event_type)?.ok_or(
        EventError::MissingRequiredAttribute {
            attribute: names.event_type,
        },
    )?;
    let source = take_string(&mut envelope, names.source)?.ok_or(
        EventError::MissingRequiredAttribute {
            attribute: names.source,
        },
    )?;
    let source = parse_url(names.source, &source)?;

    let time = take_string(&mut envelope, names.time)?
        .map(|text| {
            DateTime::parse_from_rfc3339(&text).map_err(|err| EventError::InvalidAttributeValue {
                attribute: names.time,
                reason: err.to_string(),
            })
        })
        .transpose()?;
    let schema = take_string(&mut envelope, names.schema)?
        .map(|text| parse_url(names.schema, &text))
        .transpose()?;
    let content_type = take_string(&mut envelope, names.content_type)?;

    let data = envelope.remove(DATA_FIELD);

    let mut context = build_context(
        version,
        id,
        source,
        event_type,
        time,
        schema,
        content_type.clone(),
    );

    if version == SpecVersion::V0_1 {
        if let Some(value) = envelope.remove(EXTENSIONS_FIELD) {
            let Value::Object(object) = value else {
                return Err(CodecError::MalformedPayload(
                    "extensions field is not a JSON object".to_string(),
                ));
            };
            for (name, child) in object {
                context.set_extension(&name, ExtensionValue::from_json(child))?;
            }
        }
    }
    // Remaining unrecognized top-level fields become extensions, shaped
    // by their JSON value (scalar or mapping).
    for (name, child) in envelope {
        context.set_extension(&name, ExtensionValue::from_json(child))?;
    }

    let mut event = Event::new(context);
    if let Some(value) = data {
        let declared = content_type.as_deref().unwrap_or(DEFAULT_DATA_CONTENT_TYPE);
        let bytes = match value {
            Value::String(text) if !is_json_content_type(declared) => text.into_bytes(),
            // JSON-family data is re-serialized to canonical bytes.
            other => serde_json::to_vec(&other).unwrap_or_default(),
        };
        event = event.with_data(bytes);
    }
    event.validate()?;
    Ok(event)
}

fn take_string(envelope: &mut Map<String, Value>, key: &'static str) -> Result<Option<String>> {
    match envelope.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(EventError::InvalidAttributeValue {
            attribute: key,
            reason: format!("expected a JSON string, got {other}"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use eventwire_event::{ContextV01, ContextV02, EventContext};
    use serde_json::json;
    use url::Url;

    use super::*;

    fn source() -> Url {
        Url::parse("http://example.com/source").unwrap()
    }

    #[test]
    fn minimal_event_produces_exact_envelope() {
        let event = Event::new(ContextV02::new("ABC-123", source(), "com.example.test"));
        let message = encode(&event).unwrap();

        let Message::Structured { content_type, body } = &message else {
            panic!("structured encode must produce a structured message");
        };
        assert_eq!(content_type, "application/cloudevents+json");

        let envelope: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            envelope,
            json!({
                "specversion": "0.2",
                "id": "ABC-123",
                "type": "com.example.test",
                "source": "http://example.com/source",
            })
        );
    }

    #[test]
    fn full_envelope_flattens_extensions_at_top_level() {
        let time = DateTime::parse_from_rfc3339("2018-04-05T17:31:00Z").unwrap();
        let mut context: EventContext = ContextV02::new("ABC-123", source(), "com.example.test")
            .with_time(time)
            .with_schema(Url::parse("http://example.com/schema").unwrap())
            .with_content_type("application/json")
            .into();
        context
            .set_extension("test", ExtensionValue::Scalar(json!("extended")))
            .unwrap();
        let event = Event::new(context).with_json_data(&json!({"hello": "world"}));

        let message = encode(&event).unwrap();
        let envelope: Value = serde_json::from_slice(message.body()).unwrap();
        assert_eq!(
            envelope,
            json!({
                "specversion": "0.2",
                "id": "ABC-123",
                "type": "com.example.test",
                "source": "http://example.com/source",
                "time": "2018-04-05T17:31:00Z",
                "schemaurl": "http://example.com/schema",
                "contenttype": "application/json",
                "data": { "hello": "world" },
                "test": "extended",
            })
        );
    }

    #[test]
    fn v01_envelope_nests_extensions_under_reserved_field() {
        let mut context: EventContext =
            ContextV01::new("ABC-123", source(), "com.example.test").into();
        context
            .set_extension("test", ExtensionValue::Scalar(json!("extended")))
            .unwrap();
        let event = Event::new(context);

        let message = encode(&event).unwrap();
        let envelope: Value = serde_json::from_slice(message.body()).unwrap();
        assert_eq!(
            envelope,
            json!({
                "cloudeventsversion": "0.1",
                "eventid": "ABC-123",
                "eventtype": "com.example.test",
                "source": "http://example.com/source",
                "extensions": { "test": "extended" },
            })
        );

        // And the same placement is read back.
        let decoded = decode(SpecVersion::V0_1, message.body()).unwrap();
        assert_eq!(
            decoded.context.extensions()["test"],
            ExtensionValue::Scalar(json!("extended"))
        );
    }

    #[test]
    fn decode_rebuilds_event_and_reserializes_data() {
        let body = Bytes::from(
            serde_json::to_vec(&json!({
                "specversion": "0.2",
                "id": "ABC-123",
                "type": "com.example.test",
                "source": "http://example.com/source",
                "contenttype": "application/json",
                "data": { "hello": "world" },
                "test": "extended",
            }))
            .unwrap(),
        );

        let event = decode(SpecVersion::V0_2, &body).unwrap();
        assert_eq!(event.context.id(), "ABC-123");
        assert_eq!(event.context.data_content_type(), Some("application/json"));
        assert_eq!(event.data().unwrap().as_ref(), br#"{"hello":"world"}"#);
        assert_eq!(
            event.context.extensions()["test"],
            ExtensionValue::Scalar(json!("extended"))
        );
    }

    #[test]
    fn scalar_extension_round_trip_preserves_values() {
        let mut context: EventContext =
            ContextV02::new("ABC-123", source(), "com.example.test").into();
        context
            .set_extension("count", ExtensionValue::Scalar(json!(3)))
            .unwrap();
        context
            .set_extension("nested", ExtensionValue::from_json(json!({"a": 1})))
            .unwrap();
        let event = Event::new(context);

        let message = encode(&event).unwrap();
        let decoded = decode(SpecVersion::V0_2, message.body()).unwrap();
        assert_eq!(decoded.context.extensions(), event.context.extensions());
    }

    #[test]
    fn non_object_body_is_malformed() {
        let err = decode(SpecVersion::V0_2, &Bytes::from_static(b"[1,2]")).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload(_)));

        let err = decode(SpecVersion::V0_2, &Bytes::from_static(b"not json")).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn missing_required_attribute_fails_decode() {
        let body = Bytes::from(
            serde_json::to_vec(&json!({
                "specversion": "0.2",
                "type": "com.example.test",
                "source": "http://example.com/source",
            }))
            .unwrap(),
        );

        let err = decode(SpecVersion::V0_2, &body).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Event(EventError::MissingRequiredAttribute { attribute: "id" })
        ));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let body = Bytes::from(
            serde_json::to_vec(&json!({
                "specversion": "1.0",
                "id": "ABC-123",
                "type": "com.example.test",
                "source": "http://example.com/source",
            }))
            .unwrap(),
        );

        let err = decode(SpecVersion::V0_2, &body).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Event(EventError::InvalidAttributeValue { .. })
        ));
    }

    #[test]
    fn text_data_is_embedded_as_a_json_string() {
        let event = Event::new(
            ContextV02::new("ABC-123", source(), "com.example.test")
                .with_content_type("text/plain"),
        )
        .with_data(&b"hello"[..]);

        let message = encode(&event).unwrap();
        let envelope: Value = serde_json::from_slice(message.body()).unwrap();
        assert_eq!(envelope["data"], json!("hello"));

        let decoded = decode(SpecVersion::V0_2, message.body()).unwrap();
        assert_eq!(decoded.data().unwrap().as_ref(), b"hello");
    }
}
