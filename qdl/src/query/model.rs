//! In-memory query model: object type, ordered filters, and the field tree.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A query against one object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    object_type: String,
    /// Filters in insertion order.
    #[serde(skip_serializing_if = "Filters::is_empty")]
    pub filters: Filters,
    /// Top-level field selection, rendered left to right.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<QueryField>,
}

/// A selected field, optionally with a nested selection.
///
/// Equality and drop walk the subtree with a heap stack, so arbitrarily deep
/// trees built by the parser are safe to compare and free.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawField")]
pub struct QueryField {
    name: String,
    /// Sub-selection scoped to this field; empty for a leaf.
    #[serde(rename = "fields", skip_serializing_if = "Vec::is_empty")]
    pub nested_fields: Vec<QueryField>,
}

/// Ordered map of filter key to value.
///
/// Keys are unique. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

/// Check that `s` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whitespace allowed between tokens.
pub(crate) fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn check_identifier(s: String) -> Result<String> {
    if is_identifier(&s) {
        Ok(s)
    } else {
        Err(Error::InvalidIdentifier(s))
    }
}

/// A value must survive a format/parse round trip unchanged.
fn is_filter_value(s: &str) -> bool {
    !s.is_empty() && s.trim_matches(is_ws) == s && !s.contains([',', ')'])
}

impl Query {
    /// Create an empty query for `object_type`.
    pub fn new(object_type: impl Into<String>) -> Result<Self> {
        Ok(Self {
            object_type: check_identifier(object_type.into())?,
            filters: Filters::default(),
            fields: Vec::new(),
        })
    }

    /// Assemble a query from parts the parser has already validated.
    pub(crate) fn from_parts(object_type: String, filters: Filters, fields: Vec<QueryField>) -> Self {
        Self {
            object_type,
            filters,
            fields,
        }
    }

    /// Name of the entity being queried.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Add or replace a filter, builder style.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        self.filters.insert(key, value)?;
        Ok(self)
    }

    /// Append a top-level field, builder style.
    pub fn with_field(mut self, field: QueryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Maximum nesting depth of the field tree (0 when there are no fields).
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut pending: Vec<(&QueryField, usize)> = self.fields.iter().map(|f| (f, 1)).collect();
        while let Some((field, depth)) = pending.pop() {
            max = max.max(depth);
            pending.extend(field.nested_fields.iter().map(|child| (child, depth + 1)));
        }
        max
    }
}

impl QueryField {
    /// Create a leaf field.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: check_identifier(name.into())?,
            nested_fields: Vec::new(),
        })
    }

    pub(crate) fn from_parts(name: String, nested_fields: Vec<QueryField>) -> Self {
        Self { name, nested_fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a nested field, builder style.
    pub fn with_nested(mut self, field: QueryField) -> Self {
        self.nested_fields.push(field);
        self
    }

    /// Find a direct child by name.
    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.nested_fields.iter().find(|f| f.name == name)
    }

    pub fn is_leaf(&self) -> bool {
        self.nested_fields.is_empty()
    }
}

impl PartialEq for QueryField {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.name != b.name || a.nested_fields.len() != b.nested_fields.len() {
                return false;
            }
            pending.extend(a.nested_fields.iter().zip(&b.nested_fields));
        }
        true
    }
}

impl Drop for QueryField {
    fn drop(&mut self) {
        // Detach descendants so each one drops with no children of its own.
        let mut pending = std::mem::take(&mut self.nested_fields);
        while let Some(mut field) = pending.pop() {
            pending.append(&mut field.nested_fields);
        }
    }
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filter, returning the previous value for `key` if any.
    ///
    /// An existing key keeps its position; a new key goes last.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Option<String>> {
        let key = check_identifier(key.into())?;
        let value = value.into();
        if !is_filter_value(&value) {
            return Err(Error::InvalidFilterValue { key, value });
        }
        Ok(self.insert_unchecked(key, value))
    }

    /// Insert without validation. The parser only produces valid pairs.
    pub(crate) fn insert_unchecked(&mut self, key: String, value: String) -> Option<String> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a filter; the remaining entries keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for pos in self.index.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

// Equality is order-sensitive: two filter maps with the same entries in a
// different order format differently.
impl PartialEq for Filters {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Filters {}

impl std::ops::Index<&str> for Filters {
    type Output = str;

    /// Look up a filter value by key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not present. Use [`Filters::get`] for a fallible lookup.
    fn index(&self, key: &str) -> &str {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no filter named {:?}", key),
        }
    }
}

impl Serialize for Filters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Filters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FiltersVisitor;

        impl<'de> Visitor<'de> for FiltersVisitor {
            type Value = Filters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Filters, A::Error> {
                let mut filters = Filters::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    filters.insert(key, value).map_err(serde::de::Error::custom)?;
                }
                Ok(filters)
            }
        }

        deserializer.deserialize_map(FiltersVisitor)
    }
}

/// Unvalidated shape used to deserialize a [`Query`].
#[derive(Deserialize)]
struct RawQuery {
    object_type: String,
    #[serde(default)]
    filters: Filters,
    #[serde(default)]
    fields: Vec<QueryField>,
}

impl TryFrom<RawQuery> for Query {
    type Error = Error;

    fn try_from(raw: RawQuery) -> Result<Self> {
        let mut query = Query::new(raw.object_type)?;
        query.filters = raw.filters;
        query.fields = raw.fields;
        Ok(query)
    }
}

/// Unvalidated shape used to deserialize a [`QueryField`].
#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    fields: Vec<QueryField>,
}

impl TryFrom<RawField> for QueryField {
    type Error = Error;

    fn try_from(raw: RawField) -> Result<Self> {
        let mut field = QueryField::new(raw.name)?;
        field.nested_fields = raw.fields;
        Ok(field)
    }
}
