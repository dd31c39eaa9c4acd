// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Field Values
//!
//! Raw values as the host store hands them over: strings, numbers, or sets
//! of strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw field value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
    Set(ValueSet),
}

impl FieldValue {
    /// Returns the store's string rendering of the value.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(t) => t.clone(),
            FieldValue::Set(s) => s.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<ValueSet> for FieldValue {
    fn from(value: ValueSet) -> Self {
        FieldValue::Set(value)
    }
}

/// An insertion-ordered set of strings.
///
/// Serialized as a plain JSON array; duplicates in the input are dropped.
#[derive(Clone, Debug, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ValueSet {
    items: Vec<String>,
}

impl ValueSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        ValueSet { items: Vec::new() }
    }

    /// Adds a value unless it is already present. Returns true if added.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.items.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| item == value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Returns true if every value of `other` is also in this set.
    pub fn is_superset(&self, other: &ValueSet) -> bool {
        other.iter().all(|value| self.contains(value))
    }

    /// Returns the values in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}

/// Sets are equal when they hold the same values, whatever the order.
impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_superset(other)
    }
}

impl From<Vec<String>> for ValueSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<ValueSet> for Vec<String> {
    fn from(set: ValueSet) -> Self {
        set.items
    }
}

impl<S: Into<String>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.items.join(", "))
    }
}
