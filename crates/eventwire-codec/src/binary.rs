//! Binary encoding mode: core and extension attributes become
//! marker-prefixed metadata entries, the event payload becomes the body.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat};
use eventwire_event::{
    ContextAttributes, ContextV01, ContextV02, ContextV03, ContextV10, Event, EventContext,
    EventError, ExtensionValue, SpecVersion,
};
use serde_json::Value;
use url::Url;

use crate::error::{CodecError, Result};
use crate::headers::Headers;
use crate::message::{
    is_json_content_type, Message, ATTRIBUTE_PREFIX, CONTENT_TYPE_HEADER,
    DEFAULT_DATA_CONTENT_TYPE,
};

/// Encode an event as a binary-mode message.
pub fn encode(event: &Event) -> Result<Message> {
    event.validate()?;

    let ctx = &event.context;
    let version = ctx.spec_version();
    let names = version.names();
    let mut headers = Headers::new();

    headers.insert(attribute_header(names.spec_version), version.as_str());
    headers.insert(attribute_header(names.id), ctx.id());
    headers.insert(attribute_header(names.event_type), ctx.event_type());
    headers.insert(attribute_header(names.source), ctx.source().as_str());
    if let Some(time) = ctx.time() {
        headers.insert(
            attribute_header(names.time),
            time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        );
    }
    if let Some(schema) = ctx.schema() {
        headers.insert(attribute_header(names.schema), schema.as_str());
    }

    for (name, value) in ctx.extensions() {
        match value {
            ExtensionValue::Scalar(scalar) => {
                headers.insert(attribute_header(name), json_text(scalar));
            }
            // One level of mapping is flattened to `Ce-<Name>-<Child>`;
            // mapping-valued children stay a single JSON object literal.
            ExtensionValue::Mapping(children) => {
                for (child, child_value) in children {
                    let key = attribute_header(&format!("{name}-{child}"));
                    headers.insert(key, json_text(&child_value.to_json()));
                }
            }
        }
    }

    let content_type = ctx
        .data_content_type()
        .unwrap_or(DEFAULT_DATA_CONTENT_TYPE)
        .to_string();
    headers.insert(CONTENT_TYPE_HEADER, content_type.as_str());

    let body = match event.data() {
        Some(bytes) => {
            if is_json_content_type(&content_type) {
                serde_json::from_slice::<Value>(bytes).map_err(|err| {
                    CodecError::DataSerialization {
                        content_type: content_type.clone(),
                        reason: err.to_string(),
                    }
                })?;
            }
            bytes.clone()
        }
        None => Bytes::new(),
    };

    Ok(Message::Binary { headers, body })
}

/// Decode a binary-mode message for a known spec version.
///
/// Metadata lookup is case-insensitive. Marker-prefixed entries match the
/// version's core attributes by exact name first and fall back to
/// extensions; unprefixed entries are ignored except the content type.
pub fn decode(version: SpecVersion, headers: &Headers, body: &Bytes) -> Result<Event> {
    let names = version.names();

    let mut id = None;
    let mut source = None;
    let mut event_type = None;
    let mut time = None;
    let mut schema = None;
    let mut content_type = None;
    let mut extensions: BTreeMap<String, ExtensionValue> = BTreeMap::new();

    for (name, values) in headers.iter() {
        let Some(first) = values.first().map(String::as_str) else {
            continue;
        };

        let Some(suffix) = strip_attribute_prefix(name) else {
            if name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
                content_type = Some(first.to_string());
            }
            continue;
        };
        let attribute = suffix.to_ascii_lowercase();

        if attribute == names.spec_version {
            let declared = SpecVersion::parse(first)?;
            if declared != version {
                return Err(EventError::InvalidAttributeValue {
                    attribute: names.spec_version,
                    reason: format!("declares {declared}, decoding as {version}"),
                }
                .into());
            }
        } else if attribute == names.id {
            id = Some(first.to_string());
        } else if attribute == names.event_type {
            event_type = Some(first.to_string());
        } else if attribute == names.source {
            source = Some(parse_url(names.source, first)?);
        } else if attribute == names.time {
            time = Some(DateTime::parse_from_rfc3339(first).map_err(|err| {
                EventError::InvalidAttributeValue {
                    attribute: names.time,
                    reason: err.to_string(),
                }
            })?);
        } else if attribute == names.schema {
            schema = Some(parse_url(names.schema, first)?);
        } else if attribute == names.content_type {
            // The payload content type travels in the transport's native
            // field in binary mode; a prefixed copy is not authoritative.
        } else if let Some((root, child)) = attribute.split_once('-') {
            // Two-segment names reassemble a mapping extension. The child
            // value keeps the raw wire string list verbatim -- this is the
            // documented asymmetry with encoding, not a parse step.
            let raw = Value::Array(
                values
                    .iter()
                    .map(|value| Value::String(value.clone()))
                    .collect(),
            );
            let entry = extensions
                .entry(root.to_string())
                .or_insert_with(|| ExtensionValue::Mapping(BTreeMap::new()));
            if !matches!(entry, ExtensionValue::Mapping(_)) {
                *entry = ExtensionValue::Mapping(BTreeMap::new());
            }
            if let ExtensionValue::Mapping(children) = entry {
                children.insert(child.to_string(), ExtensionValue::Scalar(raw));
            }
        } else {
            let value = serde_json::from_str(first)
                .map(ExtensionValue::Scalar)
                .unwrap_or_else(|_| ExtensionValue::Scalar(Value::String(first.to_string())));
            extensions.insert(attribute, value);
        }
    }

    let id = id.ok_or(EventError::MissingRequiredAttribute { attribute: names.id })?;
    let source = source.ok_or(EventError::MissingRequiredAttribute {
        attribute: names.source,
    })?;
    let event_type = event_type.ok_or(EventError::MissingRequiredAttribute {
        attribute: names.event_type,
    })?;

    let mut context = build_context(version, id, source, event_type, time, schema, content_type);
    for (name, value) in extensions {
        context.set_extension(&name, value)?;
    }

    let mut event = Event::new(context);
    if !body.is_empty() {
        event = event.with_data(body.clone());
    }
    event.validate()?;
    Ok(event)
}

pub(crate) fn build_context(
    version: SpecVersion,
    id: String,
    source: Url,
    event_type: String,
    time: Option<DateTime<chrono::FixedOffset>>,
    schema: Option<Url>,
    content_type: Option<String>,
) -> EventContext {
    macro_rules! build {
        ($ty:ident) => {{
            let mut ctx = $ty::new(id, source, event_type);
            if let Some(time) = time {
                ctx = ctx.with_time(time);
            }
            if let Some(schema) = schema {
                ctx = ctx.with_schema(schema);
            }
            if let Some(content_type) = content_type {
                ctx = ctx.with_content_type(content_type);
            }
            ctx.into()
        }};
    }

    match version {
        SpecVersion::V0_1 => build!(ContextV01),
        SpecVersion::V0_2 => build!(ContextV02),
        SpecVersion::V0_3 => build!(ContextV03),
        SpecVersion::V1_0 => build!(ContextV10),
    }
}

pub(crate) fn parse_url(attribute: &'static str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|err| {
            EventError::InvalidAttributeValue {
                attribute,
                reason: err.to_string(),
            }
            .into()
        })
}

/// `Ce-` plus the canonical spelling: every `-`-separated token gets a
/// leading capital (`specversion` -> `Ce-Specversion`, `asmap-c` -> `Ce-Asmap-C`).
fn attribute_header(name: &str) -> String {
    let mut out = String::with_capacity(ATTRIBUTE_PREFIX.len() + name.len());
    out.push_str(ATTRIBUTE_PREFIX);
    for (idx, token) in name.split('-').enumerate() {
        if idx > 0 {
            out.push('-');
        }
        let mut chars = token.chars();
        if let Some(head) = chars.next() {
            out.extend(head.to_uppercase());
            out.push_str(&token[head.len_utf8()..].to_ascii_lowercase());
        }
    }
    out
}

fn strip_attribute_prefix(name: &str) -> Option<&str> {
    let prefix = name.get(..ATTRIBUTE_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(ATTRIBUTE_PREFIX) {
        Some(&name[ATTRIBUTE_PREFIX.len()..])
    } else {
        None
    }
}

// Serialization of a `serde_json::Value` cannot fail.
fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
