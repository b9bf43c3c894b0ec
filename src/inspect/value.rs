//! The bounded, owned result of inspecting a value.
//!
//! Every node is `Send + 'static`, so an inspected argument can be handed to a
//! pool worker while the caller's borrowed originals stay behind.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum InspectableValue {
    Nil,
    Primitive(Primitive),
    Array(ArrayVal),
    Map(MapVal),
    Struct(StructVal),
    Opaque(OpaqueVal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

/// At most `max_array` elements; `is_truncated` iff `true_length` exceeds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayVal {
    pub element_type: &'static str,
    pub true_length: usize,
    pub is_truncated: bool,
    pub elements: Vec<InspectableValue>,
}

/// At most `max_map_keys` entries, keyed by their rendered text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapVal {
    pub type_label: &'static str,
    pub true_key_count: usize,
    pub is_truncated: bool,
    pub entries: BTreeMap<String, InspectableValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructVal {
    pub type_label: &'static str,
    pub error_string: Option<String>,
    /// Display output, kept only when it differs from `error_string`.
    pub stringer_output: Option<String>,
    /// Declaration order.
    pub fields: Vec<(&'static str, InspectableValue)>,
}

/// Why a value was not walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueKind {
    Channel,
    Function,
    RawPointer,
    /// The value is already being inspected further up the same path.
    Circular,
    /// The attempt ceiling was reached.
    DepthExceeded,
    /// Too many pointer hops.
    IndirectionExceeded,
    /// A lock, borrow flag or weak reference refused access.
    Unavailable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueVal {
    pub kind: OpaqueKind,
    pub type_label: &'static str,
    /// Shallow rendering of the value, never a walk.
    pub raw: String,
    pub display: String,
}

impl InspectableValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Primitive(Primitive::Text(value.into()))
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Primitive(Primitive::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_struct(&self) -> Option<&StructVal> {
        match self {
            Self::Struct(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_opaque(&self) -> Option<&OpaqueVal> {
        match self {
            Self::Opaque(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for InspectableValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for InspectableValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<i64> for InspectableValue {
    fn from(value: i64) -> Self {
        Self::Primitive(Primitive::Int(value))
    }
}

impl From<u64> for InspectableValue {
    fn from(value: u64) -> Self {
        Self::Primitive(Primitive::Uint(value))
    }
}

impl From<bool> for InspectableValue {
    fn from(value: bool) -> Self {
        Self::Primitive(Primitive::Bool(value))
    }
}

impl StructVal {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&InspectableValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for InspectableValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Primitive(value) => value.serialize(serializer),
            Self::Array(value) => value.serialize(serializer),
            Self::Map(value) => value.serialize(serializer),
            Self::Struct(value) => value.serialize(serializer),
            Self::Opaque(value) => value.serialize(serializer),
        }
    }
}

/// Strict: non-finite floats have no JSON form and fail the encode, which
/// sends the record down the cleanup path.
impl Serialize for Primitive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Uint(u) => serializer.serialize_u64(*u),
            Self::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Self::Float(f) => Err(S::Error::custom(format!(
                "non-finite float {f} has no JSON representation"
            ))),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for StructVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = 1
            + usize::from(self.error_string.is_some())
            + usize::from(self.stringer_output.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        map.serialize_entry("@type", self.type_label)?;
        if let Some(error) = &self.error_string {
            map.serialize_entry("@error", error)?;
        }
        if let Some(display) = &self.stringer_output {
            map.serialize_entry("@display", display)?;
        }
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
