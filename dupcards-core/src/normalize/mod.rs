// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Value Normalization
//!
//! Turns raw field values into canonical strings in three stages:
//!
//! 1. **prune**: whitespace cleanup, phone digit extraction, removal of
//!    names that merely repeat an email address
//! 2. **transform**: name reordering ("Last, First"), middle initials and
//!    name particles moved to the right part
//! 3. **abstract**: case folding, transliteration, punctuation removal and
//!    phone prefix rewriting
//!
//! Canonical values are compared with plain string equality.

mod phone;
mod text;

pub use phone::{prune_number, PhoneRules};
pub use text::{collapse_whitespace, strip_punctuation, transliterate};

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::card::field::{
    DISPLAY_NAME, EMAILS, EMAIL_FIELDS, FIRST_NAME, LAST_NAME, PHONE_FIELDS, PHONE_NUMBERS,
    PHOTO_URI,
};
use crate::card::{classify, default_value, FieldCategory, Record, ValueSet};
use crate::preferences::Preferences;

static LAST_COMMA_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,]+),\s+(.+)$").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*$").unwrap());
static LEADING_INITIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z])\s+(.*)$").unwrap());
static TRAILING_PARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\s(von|van|und|and|für|for|zum|zur|der|de|geb|ben)\s*$").unwrap()
});
static AOL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([^@]*)(@aol\..*)$").unwrap());
static GOOGLEMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@googlemail\.com$").unwrap());

/// Normalization pipeline configured from user preferences.
#[derive(Clone, Debug)]
pub struct Normalizer {
    ignored: HashSet<String>,
    phone: PhoneRules,
}

impl Normalizer {
    /// Creates a normalizer for the given preferences.
    pub fn new(prefs: &Preferences) -> Self {
        Normalizer {
            ignored: prefs.ignored_fields.iter().cloned().collect(),
            phone: PhoneRules::from_preferences(prefs),
        }
    }

    /// Returns true if the field is excluded from comparison and merging.
    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored.contains(field)
    }

    /// Prunes a single value without looking at the rest of its record.
    pub fn prune(&self, value: &str, field: &str) -> String {
        match classify(field) {
            FieldCategory::Name | FieldCategory::Text => collapse_whitespace(value),
            FieldCategory::Phone => prune_number(value),
            FieldCategory::Email => GOOGLEMAIL.replace(value.trim(), "@gmail.com").into_owned(),
            _ => value.to_string(),
        }
    }

    /// Returns the pruned value of a record field.
    ///
    /// Ignored fields yield their default. A name equal to one of the
    /// record's email addresses is dropped.
    pub fn pruned(&self, record: &Record, field: &str) -> String {
        if self.is_ignored(field) {
            return default_value(field).to_string();
        }
        let value = self.prune(&record.property(field), field);
        if classify(field) == FieldCategory::Name
            && !value.is_empty()
            && EMAIL_FIELDS
                .iter()
                .any(|email| self.pruned(record, email) == value)
        {
            return default_value(field).to_string();
        }
        value
    }

    /// Returns the pruned value after name reordering.
    pub fn transformed(&self, record: &Record, field: &str) -> String {
        match field {
            DISPLAY_NAME => transform_display_name(&self.pruned(record, field)),
            FIRST_NAME | LAST_NAME => {
                let (first, last) = self.transformed_names(record);
                if field == FIRST_NAME {
                    first
                } else {
                    last
                }
            }
            _ => self.pruned(record, field),
        }
    }

    /// Folds a transformed value into its comparable form.
    pub fn abstract_text(&self, value: &str, field: &str) -> String {
        if field == PHOTO_URI {
            return value.to_string();
        }
        let category = classify(field);

        let mut folded = match AOL_ADDRESS.captures(value) {
            // AOL local parts are case sensitive
            Some(caps) if category == FieldCategory::Email => {
                format!("{}{}", &caps[1], caps[2].to_lowercase())
            }
            _ => value.to_lowercase(),
        };
        if category.is_text() {
            folded = collapse_whitespace(&strip_punctuation(&transliterate(&folded)));
        }
        if category == FieldCategory::Phone {
            folded = self.phone.canonicalize(&folded);
        }
        folded
    }

    /// Returns the canonical form of a record field.
    pub fn canonical(&self, record: &Record, field: &str) -> String {
        self.abstract_text(&self.transformed(record, field), field)
    }

    /// Runs the pipeline on a lone value.
    ///
    /// Name swaps between FirstName and LastName need the whole record and
    /// are skipped here; DisplayName reordering is applied.
    pub fn normalize(&self, value: &str, field: &str) -> String {
        let pruned = self.prune(value, field);
        let transformed = if field == DISPLAY_NAME {
            transform_display_name(&pruned)
        } else {
            pruned
        };
        self.abstract_text(&transformed, field)
    }

    /// Returns the canonical members of a set-valued field.
    ///
    /// `__Emails` and `__PhoneNumbers` are derived from the scalar slots;
    /// other set fields are read from the record.
    pub fn canonical_set(&self, record: &Record, field: &str) -> ValueSet {
        if self.is_ignored(field) {
            return ValueSet::new();
        }
        let slots: &[&str] = match field {
            EMAILS => &EMAIL_FIELDS,
            PHONE_NUMBERS => &PHONE_FIELDS,
            _ => {
                return record
                    .set_property(field)
                    .iter()
                    .map(|member| collapse_whitespace(&member.to_lowercase()))
                    .filter(|member| !member.is_empty())
                    .collect();
            }
        };
        slots
            .iter()
            .map(|slot| self.canonical(record, slot))
            .filter(|value| !value.is_empty())
            .collect()
    }

    // FirstName and LastName are transformed together.
    fn transformed_names(&self, record: &Record) -> (String, String) {
        let mut first = self.pruned(record, FIRST_NAME);
        let mut last = self.pruned(record, LAST_NAME);

        if TRAILING_COMMA.is_match(&first) {
            // "Smith," in FirstName means the two fields were swapped
            let swapped = TRAILING_COMMA.replace(&first, "").into_owned();
            first = last;
            last = swapped;
        } else if let Some((family, given)) = split_captures(&LAST_COMMA_FIRST, &first) {
            first = if last.is_empty() {
                given
            } else {
                format!("{} {}", given, last)
            };
            last = family;
        }

        migrate_initials_and_particles(&first, &last)
    }
}

/// Splits a "Last, First" display name into first and last name.
pub fn reorder_display_name(value: &str) -> Option<(String, String)> {
    split_captures(&LAST_COMMA_FIRST, value)
        .map(|(last, first)| migrate_initials_and_particles(&first, &last))
}

fn transform_display_name(value: &str) -> String {
    match reorder_display_name(value) {
        Some((first, last)) => format!("{} {}", first, last),
        None => value.to_string(),
    }
}

/// Moves leading initials of the last name to the end of the first name,
/// and trailing name particles of the first name to the front of the last
/// name.
///
/// `("John", "A Smith")` becomes `("John A", "Smith")` and
/// `("Ludwig van", "Beethoven")` becomes `("Ludwig", "van Beethoven")`.
pub fn migrate_initials_and_particles(first: &str, last: &str) -> (String, String) {
    let mut first = first.to_string();
    let mut last = last.to_string();

    let mut initials = String::new();
    while let Some((initial, rest)) = split_captures(&LEADING_INITIAL, &last) {
        initials.push(' ');
        initials.push_str(&initial);
        last = rest;
    }

    let mut particles = String::new();
    while let Some((rest, particle)) = split_captures(&TRAILING_PARTICLE, &first) {
        particles = format!("{} {}", particle, particles);
        first = rest;
    }

    (
        format!("{}{}", first.trim(), initials),
        format!("{}{}", particles, last.trim()),
    )
}

// Owned copies of the two capture groups of a two-group pattern.
fn split_captures(pattern: &Regex, value: &str) -> Option<(String, String)> {
    pattern
        .captures(value)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Counts the characters that carry information in a pruned value:
/// digits for phone numbers, letters for everything else.
pub fn char_weight(value: &str, field: &str) -> usize {
    if classify(field) == FieldCategory::Phone {
        value.chars().filter(char::is_ascii_digit).count()
    } else {
        value.chars().filter(|c| c.is_alphabetic()).count()
    }
}
