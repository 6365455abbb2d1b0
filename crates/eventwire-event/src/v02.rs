use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::context::{AttributeNames, ContextAttributes, SpecVersion};
use crate::error::{EventError, Result};
use crate::extension::ExtensionValue;

/// Envelope context for spec revision 0.2.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextV02 {
    pub(crate) id: String,
    pub(crate) source: Url,
    pub(crate) event_type: String,
    pub(crate) time: Option<DateTime<FixedOffset>>,
    pub(crate) schema: Option<Url>,
    pub(crate) content_type: Option<String>,
    pub(crate) extensions: BTreeMap<String, ExtensionValue>,
}

impl ContextV02 {
    pub(crate) const NAMES: AttributeNames = AttributeNames {
        spec_version: "specversion",
        id: "id",
        event_type: "type",
        source: "source",
        time: "time",
        schema: "schemaurl",
        content_type: "contenttype",
    };

    pub(crate) const RESERVED: [&'static str; 8] = [
        "specversion",
        "id",
        "type",
        "source",
        "time",
        "schemaurl",
        "contenttype",
        "data",
    ];

    pub fn new(id: impl Into<String>, source: Url, event_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            event_type: event_type.into(),
            time: None,
            schema: None,
            content_type: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_schema(mut self, schema: Url) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl ContextAttributes for ContextV02 {
    fn spec_version(&self) -> SpecVersion {
        SpecVersion::V0_2
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &Url {
        &self.source
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn time(&self) -> Option<&DateTime<FixedOffset>> {
        self.time.as_ref()
    }

    fn schema(&self) -> Option<&Url> {
        self.schema.as_ref()
    }

    fn data_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn extensions(&self) -> &BTreeMap<String, ExtensionValue> {
        &self.extensions
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(EventError::MissingRequiredAttribute {
                attribute: Self::NAMES.id,
            });
        }
        if self.event_type.is_empty() {
            return Err(EventError::MissingRequiredAttribute {
                attribute: Self::NAMES.event_type,
            });
        }
        Ok(())
    }
}
