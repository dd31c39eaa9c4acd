// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Contact Record Module
//!
//! Raw contact records as owned by the host store, their field vocabulary,
//! and value types.

pub mod field;
mod value;

pub use field::{classify, default_value, is_virtual, FieldCategory};
pub use value::{FieldValue, ValueSet};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field name to final string value, as sent to the store on update.
///
/// An empty value clears the field.
pub type FieldMap = BTreeMap<String, String>;

/// Generic placeholder photo some hosts report for cards without a picture.
const GENERIC_PHOTO_URI: &str = "chrome://messenger/skin/addressbook/icons/contact-generic.png";

/// Record errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Record {record_id}: field {field} holds a set where a single value is expected")]
    MalformedValue { record_id: String, field: String },
}

/// A contact record from one address book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store identifier.
    #[serde(default)]
    id: String,
    /// Owning address book.
    #[serde(default)]
    book: String,
    /// Field values keyed by field name.
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
    /// Bumped on every local mutation; keys derived caches.
    #[serde(skip)]
    revision: u64,
}

impl Record {
    /// Creates an empty record.
    pub fn new(id: &str, book: &str) -> Self {
        Record {
            id: id.to_string(),
            book: book.to_string(),
            fields: BTreeMap::new(),
            revision: 0,
        }
    }

    pub(crate) fn from_parts(id: &str, book: &str, fields: BTreeMap<String, FieldValue>) -> Self {
        Record {
            id: id.to_string(),
            book: book.to_string(),
            fields,
            revision: 0,
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub(crate) fn set_book(&mut self, book: &str) {
        self.book = book.to_string();
    }

    /// Returns the local mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the raw value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns all raw fields.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns the names of all fields the record carries.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Sets a single field.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
        self.revision += 1;
    }

    /// Applies an update map the way the store does: empty values clear.
    pub fn apply(&mut self, update: &FieldMap) {
        for (field, value) in update {
            if value.is_empty() {
                self.fields.remove(field);
            } else {
                self.fields
                    .insert(field.clone(), FieldValue::Text(value.clone()));
            }
        }
        self.revision += 1;
    }

    /// Returns the string form of a field, or its category default.
    pub fn property(&self, field: &str) -> String {
        let category = classify(field);
        let default = category.default_value();
        let Some(value) = self.fields.get(field) else {
            return default.to_string();
        };
        let text = value.to_text();
        if text.is_empty() && category == FieldCategory::Selection {
            return default.to_string();
        }
        if field == field::PHOTO_URI && text == GENERIC_PHOTO_URI {
            return default.to_string();
        }
        text
    }

    /// Like [`Record::property`], but rejects a set stored in a single-valued field.
    pub fn scalar(&self, field: &str) -> Result<String, CardError> {
        match self.fields.get(field) {
            Some(FieldValue::Set(_)) if classify(field) != FieldCategory::Set => {
                Err(CardError::MalformedValue {
                    record_id: self.id.clone(),
                    field: field.to_string(),
                })
            }
            _ => Ok(self.property(field)),
        }
    }

    /// Returns a set-valued field; a plain value counts as a one-element set.
    pub fn set_property(&self, field: &str) -> ValueSet {
        match self.fields.get(field) {
            Some(FieldValue::Set(set)) => set.clone(),
            Some(other) => {
                let text = other.to_text();
                if text.is_empty() {
                    ValueSet::new()
                } else {
                    std::iter::once(text).collect()
                }
            }
            None => ValueSet::new(),
        }
    }

    /// Returns a numeric field, treating anything unparsable as zero.
    pub fn number(&self, field: &str) -> i64 {
        match self.fields.get(field) {
            Some(FieldValue::Number(n)) => *n,
            Some(FieldValue::Text(t)) => t.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// A short human label: display name, else first and last name, else email.
    pub fn label(&self) -> String {
        let display = self.property(field::DISPLAY_NAME);
        if !display.trim().is_empty() {
            return display;
        }
        let full = format!(
            "{} {}",
            self.property(field::FIRST_NAME),
            self.property(field::LAST_NAME)
        );
        if !full.trim().is_empty() {
            return full.trim().to_string();
        }
        self.property(field::PRIMARY_EMAIL)
    }
}
