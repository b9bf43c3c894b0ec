//! Bounded walker that turns any [`Reflect`] value into an [`InspectableValue`].
//!
//! The walk is total: a locked mutex, a dropped weak pointer, a channel or a
//! self-referential graph all degrade to an opaque placeholder instead of
//! failing, blocking or recursing without end. Three bounds apply:
//!
//! - an attempt ceiling on every parent-to-child chain (siblings do not add up),
//! - a hop limit on pointer chains, resolved iteratively,
//! - element and key caps on sequences and maps.
//!
//! On top of the ceiling, the inspector tracks the identities (address and
//! type) of the containers on the current path, so a value that reaches itself
//! renders as `Circular` at the first revisit. Maps are memoized by identity for
//! the duration of one top-level call.

pub mod cleanup;
mod macros;
mod reflect;
mod value;

pub use reflect::{
    AsDebug, AsDisplay, Field, FieldValue, GuardView, MapView, Reflect, Reflection, SeqView,
    StructView,
};
pub use value::{ArrayVal, InspectableValue, MapVal, OpaqueKind, OpaqueVal, Primitive, StructVal};

use std::collections::{BTreeMap, HashMap, HashSet};

/// Bounds applied to a single top-level inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Recursive entries allowed along one parent-to-child chain.
    pub max_attempts: usize,
    /// Elements kept per sequence; the rest only count toward `true_length`.
    pub max_array: usize,
    /// Entries kept per map, taken in the map's own iteration order.
    pub max_map_keys: usize,
    /// Pointer hops followed before giving up.
    pub max_indirection: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_array: 40,
            max_map_keys: 25,
            max_indirection: 8,
        }
    }
}

/// Inspects `value` with the default [`Limits`].
#[must_use]
pub fn inspect(value: &dyn Reflect) -> InspectableValue {
    Inspector::new(Limits::default()).inspect(value)
}

/// One level only: scalars and text keep their type, everything else becomes
/// its shallow text form. Used for pretty lines of high-performance loggers.
#[must_use]
pub fn inspect_shallow(value: &dyn Reflect) -> InspectableValue {
    let mut current = value;
    for _ in 0..=Limits::default().max_indirection {
        match current.reflect() {
            Reflection::Pointer(Some(next)) => current = next,
            Reflection::Nil | Reflection::Pointer(None) => return InspectableValue::Nil,
            Reflection::Bool(b) => return InspectableValue::Primitive(Primitive::Bool(b)),
            Reflection::Int(i) => return InspectableValue::Primitive(Primitive::Int(i)),
            Reflection::Uint(u) => return InspectableValue::Primitive(Primitive::Uint(u)),
            Reflection::Float(f) => return InspectableValue::Primitive(Primitive::Float(f)),
            Reflection::Text(text) => return InspectableValue::text(text),
            _ => return InspectableValue::text(shallow(current)),
        }
    }
    InspectableValue::text(shallow(current))
}

type Identity = (usize, &'static str);

fn identity(value: &dyn Reflect) -> Identity {
    (
        std::ptr::from_ref(value).cast::<()>().addr(),
        value.type_label(),
    )
}

/// Reusable walker state. One inspector can serve many calls on the same
/// thread; the path set and the map memo are cleared after each.
pub struct Inspector {
    limits: Limits,
    path: HashSet<Identity>,
    memo: HashMap<Identity, InspectableValue>,
}

impl Inspector {
    /// An inspector applying `limits` to every top-level call.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            path: HashSet::new(),
            memo: HashMap::new(),
        }
    }

    /// Bounds this inspector was built with.
    #[must_use]
    pub const fn limits(&self) -> Limits {
        self.limits
    }

    /// One top-level call. Memoized maps are forgotten afterwards.
    pub fn inspect(&mut self, value: &dyn Reflect) -> InspectableValue {
        let result = self.inspect_at(value, 0, 0);
        self.path.clear();
        self.memo.clear();
        result
    }

    /// Inspects `value` found `depth` containers below the root after
    /// `attempts` recursive entries.
    pub fn inspect_at(
        &mut self,
        value: &dyn Reflect,
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        if attempts > self.limits.max_attempts {
            return opaque(OpaqueKind::DepthExceeded, value, shallow(value));
        }

        let mut current = value;
        let mut hops = 0;
        let reflection = loop {
            match current.reflect() {
                Reflection::Pointer(None) => return InspectableValue::Nil,
                Reflection::Pointer(Some(next)) => {
                    hops += 1;
                    if hops > self.limits.max_indirection {
                        return opaque(
                            OpaqueKind::IndirectionExceeded,
                            value,
                            format!("{hops} hops"),
                        );
                    }
                    current = next;
                }
                other => break other,
            }
        };

        self.dispatch(current, reflection, depth, attempts)
    }

    fn dispatch(
        &mut self,
        value: &dyn Reflect,
        reflection: Reflection<'_>,
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        match reflection {
            Reflection::Nil => InspectableValue::Nil,
            Reflection::Bool(b) => InspectableValue::Primitive(Primitive::Bool(b)),
            Reflection::Int(i) => InspectableValue::Primitive(Primitive::Int(i)),
            Reflection::Uint(u) => InspectableValue::Primitive(Primitive::Uint(u)),
            Reflection::Float(f) => InspectableValue::Primitive(Primitive::Float(f)),
            Reflection::Text(text) => InspectableValue::text(text.into_owned()),
            Reflection::Bytes(bytes) => InspectableValue::text(String::from_utf8_lossy(bytes)),
            Reflection::Seq(view) => self.on_path(value, |this| {
                this.inspect_seq(&*view, depth, attempts)
            }),
            Reflection::Map(view) => {
                let key = identity(value);
                if let Some(done) = self.memo.get(&key) {
                    return done.clone();
                }
                let result = self.on_path(value, |this| {
                    this.inspect_map(value, &*view, depth, attempts)
                });
                if matches!(result, InspectableValue::Map(_)) {
                    self.memo.insert(key, result.clone());
                }
                result
            }
            Reflection::Struct(view) => self.on_path(value, |this| {
                this.inspect_struct(value, view, depth, attempts)
            }),
            Reflection::Error(error) => self.inspect_error(value.type_label(), error, depth, attempts),
            Reflection::Guarded(guard) => self.on_path(value, |this| {
                this.inspect_guarded(value, guard, depth, attempts)
            }),
            Reflection::Channel { element } => {
                opaque(OpaqueKind::Channel, value, format!("chan {element}"))
            }
            Reflection::Function { signature } => {
                opaque(OpaqueKind::Function, value, signature.to_string())
            }
            Reflection::RawPointer(addr) => {
                opaque(OpaqueKind::RawPointer, value, format!("{addr:#x}"))
            }
            Reflection::Opaque { raw, display } => InspectableValue::Opaque(OpaqueVal {
                kind: OpaqueKind::Unknown,
                type_label: value.type_label(),
                display: display.unwrap_or_else(|| raw.clone()),
                raw,
            }),
            // Unreachable after resolution; kept total.
            Reflection::Pointer(_) => {
                opaque(OpaqueKind::IndirectionExceeded, value, shallow(value))
            }
        }
    }

    /// Runs `walk` with `value` on the current path, or reports a cycle.
    fn on_path(
        &mut self,
        value: &dyn Reflect,
        walk: impl FnOnce(&mut Self) -> InspectableValue,
    ) -> InspectableValue {
        let key = identity(value);
        if !self.path.insert(key) {
            return opaque(OpaqueKind::Circular, value, shallow(value));
        }
        let result = walk(self);
        self.path.remove(&key);
        result
    }

    fn inspect_seq(&mut self, view: &dyn SeqView, depth: usize, attempts: usize) -> InspectableValue {
        let element_type = view.element_type();
        if element_type == std::any::type_name::<u8>() {
            let bytes: Vec<u8> = view
                .items()
                .filter_map(|item| match item.reflect() {
                    Reflection::Uint(byte) => u8::try_from(byte).ok(),
                    _ => None,
                })
                .collect();
            return InspectableValue::text(String::from_utf8_lossy(&bytes));
        }

        let true_length = view.len();
        let mut elements = Vec::with_capacity(true_length.min(self.limits.max_array));
        for item in view.items().take(self.limits.max_array) {
            elements.push(self.inspect_at(item, depth + 1, attempts + 1));
        }
        InspectableValue::Array(ArrayVal {
            element_type,
            true_length,
            is_truncated: true_length > self.limits.max_array,
            elements,
        })
    }

    fn inspect_map(
        &mut self,
        value: &dyn Reflect,
        view: &dyn MapView,
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        let true_key_count = view.len();
        let mut entries = BTreeMap::new();
        for (key, item) in view.entries().take(self.limits.max_map_keys) {
            let rendered = self.inspect_at(item, depth + 1, attempts + 1);
            entries.insert(key_text(key), rendered);
        }
        InspectableValue::Map(MapVal {
            type_label: value.type_label(),
            true_key_count,
            is_truncated: true_key_count > self.limits.max_map_keys,
            entries,
        })
    }

    fn inspect_struct(
        &mut self,
        value: &dyn Reflect,
        view: &dyn StructView,
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        let error_string = view.error_text();
        let stringer_output = view
            .display_text()
            .filter(|display| error_string.as_ref() != Some(display));

        let fields = view
            .fields()
            .into_iter()
            .map(|field| {
                let rendered = match field.value {
                    FieldValue::Visible(inner) => self.inspect_at(inner, depth + 1, attempts + 1),
                    FieldValue::Hidden(type_label) => {
                        InspectableValue::text(format!("<hidden: {type_label}>"))
                    }
                };
                (field.name, rendered)
            })
            .collect();

        InspectableValue::Struct(StructVal {
            type_label: value.type_label(),
            error_string,
            stringer_output,
            fields,
        })
    }

    fn inspect_error(
        &mut self,
        type_label: &'static str,
        error: &(dyn std::error::Error + 'static),
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        let mut fields = Vec::new();
        if let Some(source) = error.source() {
            let rendered = if attempts + 1 > self.limits.max_attempts {
                InspectableValue::Opaque(OpaqueVal {
                    kind: OpaqueKind::DepthExceeded,
                    type_label: ERROR_SOURCE_LABEL,
                    raw: source.to_string(),
                    display: format!("({ERROR_SOURCE_LABEL})"),
                })
            } else {
                self.inspect_error(ERROR_SOURCE_LABEL, source, depth + 1, attempts + 1)
            };
            fields.push(("source", rendered));
        }
        InspectableValue::Struct(StructVal {
            type_label,
            error_string: Some(error.to_string()),
            stringer_output: None,
            fields,
        })
    }

    fn inspect_guarded(
        &mut self,
        value: &dyn Reflect,
        guard: &dyn GuardView,
        depth: usize,
        attempts: usize,
    ) -> InspectableValue {
        let mut result = None;
        guard.with_inner(&mut |inner| {
            result = Some(match inner {
                Ok(inner) => self.inspect_at(inner, depth, attempts + 1),
                Err(reason) => opaque(OpaqueKind::Unavailable, value, reason.to_string()),
            });
        });
        result.unwrap_or_else(|| opaque(OpaqueKind::Unavailable, value, "not visited".into()))
    }
}

const ERROR_SOURCE_LABEL: &str = "dyn Error";

fn opaque(kind: OpaqueKind, value: &dyn Reflect, raw: String) -> InspectableValue {
    let type_label = value.type_label();
    InspectableValue::Opaque(OpaqueVal {
        kind,
        type_label,
        raw,
        display: format!("({type_label})"),
    })
}

/// One-level rendering that never descends into children.
fn shallow(value: &dyn Reflect) -> String {
    match value.reflect() {
        Reflection::Nil | Reflection::Pointer(None) => "nil".to_string(),
        Reflection::Bool(b) => b.to_string(),
        Reflection::Int(i) => i.to_string(),
        Reflection::Uint(u) => u.to_string(),
        Reflection::Float(f) => f.to_string(),
        Reflection::Text(text) => text.into_owned(),
        Reflection::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Reflection::Seq(view) => format!("[{} x {}]", view.len(), view.element_type()),
        Reflection::Map(view) => format!("{{{} keys}}", view.len()),
        Reflection::Struct(view) => view
            .display_text()
            .or_else(|| view.error_text())
            .unwrap_or_else(|| format!("{} {{..}}", value.type_label())),
        Reflection::Error(error) => error.to_string(),
        Reflection::Opaque { raw, .. } => raw,
        Reflection::Channel { element } => format!("chan {element}"),
        Reflection::Function { signature } => signature.to_string(),
        Reflection::RawPointer(addr) => format!("{addr:#x}"),
        Reflection::Pointer(Some(_)) | Reflection::Guarded(_) => {
            format!("&{}", value.type_label())
        }
    }
}

/// Map keys become strings without walking: text as-is, scalars formatted,
/// anything else by display text or type.
fn key_text(key: &dyn Reflect) -> String {
    let mut current = key;
    for _ in 0..Limits::default().max_indirection {
        match current.reflect() {
            Reflection::Pointer(Some(next)) => current = next,
            Reflection::Struct(view) => {
                return view
                    .display_text()
                    .unwrap_or_else(|| format!("<{}>", current.type_label()));
            }
            Reflection::Seq(_)
            | Reflection::Map(_)
            | Reflection::Guarded(_)
            | Reflection::Opaque { .. } => return format!("<{}>", current.type_label()),
            _ => return shallow(current),
        }
    }
    format!("<{}>", current.type_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_do_not_share_the_attempt_budget() {
        let limits = Limits {
            max_attempts: 2,
            ..Limits::default()
        };
        let wide: Vec<Vec<i32>> = (0..20).map(|i| vec![i]).collect();
        let result = Inspector::new(limits).inspect(&wide);
        let InspectableValue::Array(outer) = result else {
            panic!("expected array");
        };
        assert_eq!(outer.elements.len(), 20);
        assert!(outer.elements.iter().all(|e| matches!(e, InspectableValue::Array(_))));
    }

    #[test]
    fn ceiling_turns_subtree_opaque() {
        let limits = Limits {
            max_attempts: 1,
            ..Limits::default()
        };
        let nested = vec![vec![vec![1_u16]]];
        let result = Inspector::new(limits).inspect(&nested);
        let InspectableValue::Array(outer) = result else {
            panic!("expected array");
        };
        let InspectableValue::Array(inner) = &outer.elements[0] else {
            panic!("expected inner array");
        };
        let leaf = inner.elements[0].as_opaque().unwrap();
        assert_eq!(leaf.kind, OpaqueKind::DepthExceeded);
        assert_eq!(leaf.raw, "[1 x u16]");
    }

    #[test]
    fn keys_render_as_text() {
        let mut map = std::collections::HashMap::new();
        map.insert(7_u32, "seven");
        let result = inspect(&map);
        let InspectableValue::Map(map) = result else {
            panic!("expected map");
        };
        assert_eq!(map.entries["7"].as_text(), Some("seven"));
    }
}
