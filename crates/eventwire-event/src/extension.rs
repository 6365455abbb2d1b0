use std::collections::BTreeMap;

use serde_json::Value;

/// Dynamically-typed value of a non-core (extension) attribute.
///
/// A closed shape set: either a JSON scalar (string, number, bool, null,
/// or array) or an ordered mapping of child names to further values.
/// Arbitrary JSON converts losslessly — objects become `Mapping`, all
/// other shapes become `Scalar`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionValue {
    /// Any non-object JSON value.
    Scalar(Value),
    /// Ordered mapping from child name to value.
    Mapping(BTreeMap<String, ExtensionValue>),
}

impl ExtensionValue {
    /// Build from any JSON value, converting objects to `Mapping`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => ExtensionValue::Mapping(
                map.into_iter()
                    .map(|(name, child)| (name, ExtensionValue::from_json(child)))
                    .collect(),
            ),
            other => ExtensionValue::Scalar(other),
        }
    }

    /// Convenience constructor for string-valued extensions.
    pub fn string(value: impl Into<String>) -> Self {
        ExtensionValue::Scalar(Value::String(value.into()))
    }

    /// Convert back to a plain JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            ExtensionValue::Scalar(value) => value.clone(),
            ExtensionValue::Mapping(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_json()))
                    .collect(),
            ),
        }
    }

    /// The scalar value, if this is a `Scalar`.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ExtensionValue::Scalar(value) => Some(value),
            ExtensionValue::Mapping(_) => None,
        }
    }

    /// The child mapping, if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, ExtensionValue>> {
        match self {
            ExtensionValue::Scalar(_) => None,
            ExtensionValue::Mapping(children) => Some(children),
        }
    }
}

impl From<Value> for ExtensionValue {
    fn from(value: Value) -> Self {
        ExtensionValue::from_json(value)
    }
}
