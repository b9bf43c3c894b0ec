//! Encode-safe fallback for records the strict encoder rejected.
//!
//! Produces plain `serde_json::Value` trees that always serialize: containers
//! lose their metadata wrappers, non-finite floats and opaque values become
//! placeholder strings carrying the original type name.

use super::value::{InspectableValue, OpaqueKind, OpaqueVal, Primitive};
use crate::record::MetaFields;
use serde_json::{Map, Number, Value};

#[must_use]
pub fn clean(value: &InspectableValue) -> Value {
    match value {
        InspectableValue::Nil => Value::Null,
        InspectableValue::Primitive(primitive) => clean_primitive(primitive),
        InspectableValue::Array(array) => {
            let mut items: Vec<Value> = array.elements.iter().map(clean).collect();
            if array.is_truncated {
                let hidden = array.true_length.saturating_sub(array.elements.len());
                items.push(Value::String(format!("(+{hidden} more)")));
            }
            Value::Array(items)
        }
        InspectableValue::Map(map) => Value::Object(
            map.entries
                .iter()
                .map(|(key, item)| (key.clone(), clean(item)))
                .collect(),
        ),
        InspectableValue::Struct(value) => {
            let mut object = Map::new();
            object.insert("@type".into(), Value::String(value.type_label.to_string()));
            if let Some(error) = &value.error_string {
                object.insert("@error".into(), Value::String(error.clone()));
            }
            if let Some(display) = &value.stringer_output {
                object.insert("@display".into(), Value::String(display.clone()));
            }
            for (name, field) in &value.fields {
                object.insert((*name).to_string(), clean(field));
            }
            Value::Object(object)
        }
        InspectableValue::Opaque(value) => Value::String(placeholder(value)),
    }
}

/// Meta fields as a flat object, cleaned value by value.
#[must_use]
pub fn clean_meta(meta: &MetaFields) -> Map<String, Value> {
    meta.iter()
        .map(|(key, value)| (key.to_string(), clean(value)))
        .collect()
}

fn clean_primitive(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Bool(b) => Value::Bool(*b),
        Primitive::Int(i) => Value::from(*i),
        Primitive::Uint(u) => Value::from(*u),
        Primitive::Float(f) => {
            Number::from_f64(*f).map_or_else(|| Value::String(format!("(f64:{f})")), Value::Number)
        }
        Primitive::Text(s) => Value::String(s.clone()),
    }
}

/// Fixed placeholder per opaque kind.
#[must_use]
pub fn placeholder(value: &OpaqueVal) -> String {
    let label = value.type_label;
    match value.kind {
        OpaqueKind::Channel => format!("({})", value.raw),
        OpaqueKind::Function => format!("(func {})", value.raw),
        OpaqueKind::RawPointer => format!("(raw-pointer {})", value.raw),
        OpaqueKind::Circular => format!("(circular {label})"),
        OpaqueKind::DepthExceeded => format!("(depth-exceeded {label}: {})", value.raw),
        OpaqueKind::IndirectionExceeded => format!("(indirection-exceeded {label})"),
        OpaqueKind::Unavailable => format!("(unavailable {label}: {})", value.raw),
        OpaqueKind::Unknown => format!("(unknown type: {label}: {})", value.display),
    }
}
