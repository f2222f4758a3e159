//! Property system for kind-specific node and edge metadata.
//!
//! Provides type-safe property storage with a builder pattern. Keys are kept
//! in sorted order so two graphs built from the same input serialize alike.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strongly-typed property value for node/edge metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// String value (paths, access levels, type spellings)
    String(String),
    /// Integer value (line numbers, counts)
    Int(i64),
    /// Boolean flag (is_virtual, is_const, is_definition)
    Bool(bool),
    /// List of strings (declaring files, usage roles)
    StringList(Vec<String>),
    /// List of integers (call sites)
    IntList(Vec<i64>),
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::StringList(value)
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(value: Vec<i64>) -> Self {
        PropertyValue::IntList(value)
    }
}

/// Key-value metadata store for nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    data: BTreeMap<String, PropertyValue>,
}

impl PropertyMap {
    /// Create a new empty property map.
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Builder pattern: add a property and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Insert a property value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a property value by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.data.get(key)
    }

    /// Remove a property by key.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.data.remove(key)
    }

    /// Check if a property exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of properties.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the property map is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.data.iter()
    }

    /// Type-safe getter for string properties.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(PropertyValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Type-safe getter for integer properties.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.data.get(key) {
            Some(PropertyValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Type-safe getter for boolean properties.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get(key) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Type-safe getter for string list properties.
    pub fn get_string_list(&self, key: &str) -> Option<&[String]> {
        match self.data.get(key) {
            Some(PropertyValue::StringList(list)) => Some(list),
            _ => None,
        }
    }

    /// Type-safe getter for integer list properties.
    pub fn get_int_list(&self, key: &str) -> Option<&[i64]> {
        match self.data.get(key) {
            Some(PropertyValue::IntList(list)) => Some(list),
            _ => None,
        }
    }

    /// Merge `values` into the string list under `key`, keeping it sorted and unique.
    ///
    /// A non-list value already stored under `key` is replaced.
    pub fn union_strings<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Vec<String> = self.get_string_list(key).map(<[String]>::to_vec).unwrap_or_default();
        merged.extend(values.into_iter().map(Into::into));
        merged.sort();
        merged.dedup();
        self.data.insert(key.to_string(), PropertyValue::StringList(merged));
    }

    /// Merge `values` into the integer list under `key`, keeping it sorted and unique.
    pub fn union_ints<I>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = i64>,
    {
        let mut merged: Vec<i64> = self.get_int_list(key).map(<[i64]>::to_vec).unwrap_or_default();
        merged.extend(values);
        merged.sort_unstable();
        merged.dedup();
        self.data.insert(key.to_string(), PropertyValue::IntList(merged));
    }

    /// Union every list-valued entry of `other` into `self`; scalar entries
    /// of `other` only fill keys that are absent here.
    pub fn absorb(&mut self, other: &PropertyMap) {
        for (key, value) in other.iter() {
            match value {
                PropertyValue::StringList(list) => self.union_strings(key, list.iter().cloned()),
                PropertyValue::IntList(list) => self.union_ints(key, list.iter().copied()),
                _ => {
                    if !self.data.contains_key(key) {
                        self.data.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self {
            data: BTreeMap::from_iter(iter),
        }
    }
}
