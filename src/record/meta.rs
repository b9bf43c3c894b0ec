//! Structured tags attached to a record, kept apart from positional arguments.

use crate::inspect::{InspectableValue, Reflect, Reflection, inspect};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Key under which a [`LogId`] is stored.
pub const LOG_ID_KEY: &str = "log_id";
/// Key under which the record's sequence number is stored.
pub const LOG_NUM_KEY: &str = "log_num";

/// String-keyed map of inspected values.
///
/// Its own type, never a caller map, so argument scanning tells it apart by
/// type. Merging copies: a logger's fields are never shared mutably with a
/// child or a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaFields {
    fields: BTreeMap<String, InspectableValue>,
}

impl MetaFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: &dyn Reflect) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: &dyn Reflect) {
        self.fields.insert(key.into(), inspect(value));
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: InspectableValue) {
        self.fields.insert(key.into(), value);
    }

    /// Builds fields from an alternating key/value list.
    ///
    /// # Panics
    /// If the list has odd length or a key is not a string. Both mean the
    /// calling code is wrong, not the data.
    #[must_use]
    pub fn pairs(items: &[&dyn Reflect]) -> Self {
        assert!(
            items.len() % 2 == 0,
            "meta field pairs need an even number of items, got {}",
            items.len()
        );
        let mut fields = Self::new();
        for (index, pair) in items.chunks_exact(2).enumerate() {
            let key = match pair[0].reflect() {
                Reflection::Text(key) => key.into_owned(),
                _ => panic!(
                    "meta field key at position {} must be a string, got {}",
                    index * 2,
                    pair[0].type_label()
                ),
            };
            fields.insert(key, pair[1]);
        }
        fields
    }

    /// Every environment variable starting with `prefix`, keyed by the rest
    /// of its name.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// [`from_env`](Self::from_env) over an explicit variable list.
    #[must_use]
    pub fn from_vars(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut fields = Self::new();
        if prefix.is_empty() {
            return fields;
        }
        for (name, value) in vars {
            if let Some(key) = name.strip_prefix(prefix)
                && !key.is_empty()
            {
                fields.insert_value(key, InspectableValue::text(value));
            }
        }
        fields
    }

    /// Copies `other` in; its keys win.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&InspectableValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InspectableValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl Serialize for MetaFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Correlation id carried in a record's meta fields under `log_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogId(String);

impl LogId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last 12 characters, as shown on pretty lines.
    #[must_use]
    pub fn short(&self) -> &str {
        short_id(&self.0)
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    let start = id.char_indices().rev().nth(11).map_or(0, |(index, _)| index);
    &id[start..]
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[must_use]
pub fn log_id(id: impl Into<String>) -> LogId {
    LogId::new(id)
}
