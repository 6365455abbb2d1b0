use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::error::{EventError, Result};
use crate::extension::ExtensionValue;
use crate::v01::ContextV01;
use crate::v02::ContextV02;
use crate::v03::ContextV03;
use crate::v10::ContextV10;

/// Supported envelope spec revisions.
///
/// A closed set -- adding a revision is a compile-checked change, every
/// dispatch site is an exhaustive `match` on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecVersion {
    V0_1,
    V0_2,
    V0_3,
    V1_0,
}

/// Canonical (lower-case) core-attribute names for one envelope revision.
///
/// These double as the structured-mode JSON field names and as the suffix
/// of binary-mode metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeNames {
    pub spec_version: &'static str,
    pub id: &'static str,
    pub event_type: &'static str,
    pub source: &'static str,
    pub time: &'static str,
    pub schema: &'static str,
    pub content_type: &'static str,
}

impl SpecVersion {
    /// The wire spelling of this revision, e.g. `"0.2"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SpecVersion::V0_1 => "0.1",
            SpecVersion::V0_2 => "0.2",
            SpecVersion::V0_3 => "0.3",
            SpecVersion::V1_0 => "1.0",
        }
    }

    /// Parse a wire spelling. Fails closed on anything unrecognized.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "0.1" => Ok(SpecVersion::V0_1),
            "0.2" => Ok(SpecVersion::V0_2),
            "0.3" => Ok(SpecVersion::V0_3),
            "1.0" => Ok(SpecVersion::V1_0),
            other => Err(EventError::UnknownSpecVersion(other.to_string())),
        }
    }

    /// Core-attribute names for this revision.
    pub fn names(self) -> &'static AttributeNames {
        match self {
            SpecVersion::V0_1 => &ContextV01::NAMES,
            SpecVersion::V0_2 => &ContextV02::NAMES,
            SpecVersion::V0_3 => &ContextV03::NAMES,
            SpecVersion::V1_0 => &ContextV10::NAMES,
        }
    }

    /// Names an extension attribute may never use under this revision.
    pub fn reserved(self) -> &'static [&'static str] {
        match self {
            SpecVersion::V0_1 => &ContextV01::RESERVED,
            SpecVersion::V0_2 => &ContextV02::RESERVED,
            SpecVersion::V0_3 => &ContextV03::RESERVED,
            SpecVersion::V1_0 => &ContextV10::RESERVED,
        }
    }

    pub fn is_reserved(self, name: &str) -> bool {
        self.reserved().contains(&name)
    }
}

impl std::fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability surface every envelope revision exposes.
///
/// All components outside this crate interact with a context only through
/// these accessors, never through version-specific field names.
pub trait ContextAttributes {
    fn spec_version(&self) -> SpecVersion;
    fn id(&self) -> &str;
    fn source(&self) -> &Url;
    fn event_type(&self) -> &str;
    fn time(&self) -> Option<&DateTime<FixedOffset>>;
    fn schema(&self) -> Option<&Url>;
    fn data_content_type(&self) -> Option<&str>;
    fn extensions(&self) -> &BTreeMap<String, ExtensionValue>;

    /// Check the revision's invariants, returning the first violation.
    fn validate(&self) -> Result<()>;
}

/// Version-polymorphic envelope: one variant per supported revision.
#[derive(Debug, Clone, PartialEq)]
pub enum EventContext {
    V0_1(ContextV01),
    V0_2(ContextV02),
    V0_3(ContextV03),
    V1_0(ContextV10),
}

macro_rules! dispatch {
    ($self:expr, $ctx:ident => $body:expr) => {
        match $self {
            EventContext::V0_1($ctx) => $body,
            EventContext::V0_2($ctx) => $body,
            EventContext::V0_3($ctx) => $body,
            EventContext::V1_0($ctx) => $body,
        }
    };
}

impl ContextAttributes for EventContext {
    fn spec_version(&self) -> SpecVersion {
        dispatch!(self, ctx => ctx.spec_version())
    }

    fn id(&self) -> &str {
        dispatch!(self, ctx => ctx.id())
    }

    fn source(&self) -> &Url {
        dispatch!(self, ctx => ctx.source())
    }

    fn event_type(&self) -> &str {
        dispatch!(self, ctx => ctx.event_type())
    }

    fn time(&self) -> Option<&DateTime<FixedOffset>> {
        dispatch!(self, ctx => ctx.time())
    }

    fn schema(&self) -> Option<&Url> {
        dispatch!(self, ctx => ctx.schema())
    }

    fn data_content_type(&self) -> Option<&str> {
        dispatch!(self, ctx => ctx.data_content_type())
    }

    fn extensions(&self) -> &BTreeMap<String, ExtensionValue> {
        dispatch!(self, ctx => ctx.extensions())
    }

    fn validate(&self) -> Result<()> {
        dispatch!(self, ctx => ctx.validate())
    }
}

impl EventContext {
    /// Attach an extension attribute.
    ///
    /// Names are lower-cased; names reserved by the revision are rejected,
    /// keeping extension keys disjoint from core-attribute names.
    pub fn set_extension(&mut self, name: &str, value: ExtensionValue) -> Result<()> {
        let name = name.to_ascii_lowercase();
        if self.spec_version().is_reserved(&name) {
            return Err(EventError::ReservedExtensionName(name));
        }
        dispatch!(self, ctx => ctx.extensions.insert(name, value));
        Ok(())
    }

    /// Re-target this context at another envelope revision.
    ///
    /// Attributes are carried across through the capability surface;
    /// extensions are re-checked against the target's reserved names.
    pub fn to_version(&self, target: SpecVersion) -> Result<EventContext> {
        if self.spec_version() == target {
            return Ok(self.clone());
        }

        let mut out = match target {
            SpecVersion::V0_1 => EventContext::V0_1(ContextV01::new(
                self.id(),
                self.source().clone(),
                self.event_type(),
            )),
            SpecVersion::V0_2 => EventContext::V0_2(ContextV02::new(
                self.id(),
                self.source().clone(),
                self.event_type(),
            )),
            SpecVersion::V0_3 => EventContext::V0_3(ContextV03::new(
                self.id(),
                self.source().clone(),
                self.event_type(),
            )),
            SpecVersion::V1_0 => EventContext::V1_0(ContextV10::new(
                self.id(),
                self.source().clone(),
                self.event_type(),
            )),
        };

        dispatch!(&mut out, ctx => {
            ctx.time = self.time().cloned();
            ctx.schema = self.schema().cloned();
            ctx.content_type = self.data_content_type().map(str::to_string);
        });
        for (name, value) in self.extensions() {
            out.set_extension(name, value.clone())?;
        }
        Ok(out)
    }
}

impl From<ContextV01> for EventContext {
    fn from(ctx: ContextV01) -> Self {
        EventContext::V0_1(ctx)
    }
}

impl From<ContextV02> for EventContext {
    fn from(ctx: ContextV02) -> Self {
        EventContext::V0_2(ctx)
    }
}

impl From<ContextV03> for EventContext {
    fn from(ctx: ContextV03) -> Self {
        EventContext::V0_3(ctx)
    }
}

impl From<ContextV10> for EventContext {
    fn from(ctx: ContextV10) -> Self {
        EventContext::V1_0(ctx)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn source() -> Url {
        Url::parse("http://example.com/source").unwrap()
    }

    #[test]
    fn spec_version_parses_known_revisions() {
        assert_eq!(SpecVersion::parse("0.2").unwrap(), SpecVersion::V0_2);
        assert_eq!(SpecVersion::parse("1.0").unwrap(), SpecVersion::V1_0);
        assert!(matches!(
            SpecVersion::parse("2.0"),
            Err(EventError::UnknownSpecVersion(_))
        ));
    }

    #[test]
    fn names_vary_by_version() {
        assert_eq!(SpecVersion::V0_1.names().id, "eventid");
        assert_eq!(SpecVersion::V0_2.names().id, "id");
        assert_eq!(SpecVersion::V0_3.names().content_type, "datacontenttype");
        assert_eq!(SpecVersion::V1_0.names().schema, "dataschema");
    }

    #[test]
    fn extension_names_are_lowercased() {
        let mut ctx: EventContext =
            ContextV02::new("ABC-123", source(), "com.example.test").into();
        ctx.set_extension("MyExt", ExtensionValue::string("v"))
            .unwrap();
        assert!(ctx.extensions().contains_key("myext"));
    }

    #[test]
    fn reserved_extension_names_are_rejected() {
        let mut ctx: EventContext =
            ContextV02::new("ABC-123", source(), "com.example.test").into();
        let err = ctx
            .set_extension("specversion", ExtensionValue::string("v"))
            .unwrap_err();
        assert!(matches!(err, EventError::ReservedExtensionName(_)));

        // v0.1 reserves its own spelling, not the v0.2 one.
        let mut ctx: EventContext =
            ContextV01::new("ABC-123", source(), "com.example.test").into();
        ctx.set_extension("specversion", ExtensionValue::string("v"))
            .unwrap();
        assert!(matches!(
            ctx.set_extension("cloudeventsversion", ExtensionValue::string("v")),
            Err(EventError::ReservedExtensionName(_))
        ));
    }

    #[test]
    fn to_version_carries_attributes_across() {
        let mut ctx: EventContext = ContextV02::new("ABC-123", source(), "com.example.test")
            .with_schema(Url::parse("http://example.com/schema").unwrap())
            .with_content_type("application/json")
            .into();
        ctx.set_extension("test", ExtensionValue::Scalar(json!("extended")))
            .unwrap();

        let upgraded = ctx.to_version(SpecVersion::V1_0).unwrap();
        assert_eq!(upgraded.spec_version(), SpecVersion::V1_0);
        assert_eq!(upgraded.id(), "ABC-123");
        assert_eq!(upgraded.schema().unwrap().as_str(), "http://example.com/schema");
        assert_eq!(upgraded.data_content_type(), Some("application/json"));
        assert_eq!(
            upgraded.extensions()["test"],
            ExtensionValue::Scalar(json!("extended"))
        );
    }
}
