// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Merging two duplicate records into one.
//!
//! The merge is computed, never applied: the caller hands the result to the
//! store as a single update and then deletes the other record.

use std::collections::BTreeSet;

use crate::card::field::{CUSTOM_FIELDS, EMAIL_FIELDS, NOTES, PHONE_FIELDS, WEB_PAGE_FIELDS};
use crate::card::{classify, is_virtual, FieldCategory, FieldMap, Record, ValueSet};
use crate::normalize::Normalizer;

/// Multi-slot field groups and the label of their overflow in the notes.
const SLOT_GROUPS: [(&[&str], &str); 4] = [
    (&EMAIL_FIELDS, "Additional emails"),
    (&PHONE_FIELDS, "Additional phone numbers"),
    (&WEB_PAGE_FIELDS, "Additional web pages"),
    (&CUSTOM_FIELDS, "Additional custom fields"),
];

/// Label of the notes block holding values that lost a merge.
const DISPLACED_LABEL: &str = "Other values";

const NOTES_SEPARATOR: &str = "\n\n";

/// Final field values of a merged record.
///
/// An empty value means the field is cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeResult {
    fields: FieldMap,
}

impl MergeResult {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Returns the merged notes, or "" if there are none.
    pub fn notes(&self) -> &str {
        self.get(NOTES).unwrap_or_default()
    }
}

impl From<MergeResult> for FieldMap {
    fn from(result: MergeResult) -> Self {
        result.fields
    }
}

/// Merges `other` into `keep`.
///
/// Emails, phone numbers, web pages and custom fields are pooled and
/// reassigned to their slots, keep's values first; what does not fit goes
/// to the notes. Other text fields take the longer value, other fields
/// prefer keep's value. A value that loses and is not part of the winner is
/// listed in the notes too, so nothing is dropped.
pub fn merge(normalizer: &Normalizer, keep: &Record, other: &Record) -> MergeResult {
    let mergeable = |field: &&str| {
        !is_virtual(field) && !normalizer.is_ignored(field) && classify(field) != FieldCategory::Meta
    };

    let mut fields: FieldMap = keep
        .field_names()
        .filter(mergeable)
        .map(|field| (field.to_string(), keep.property(field)))
        .filter(|(_, value)| !value.is_empty())
        .collect();
    let mut notes = Vec::new();

    let mut handled: BTreeSet<&str> = BTreeSet::from([NOTES]);
    for (slots, label) in SLOT_GROUPS {
        let slots: Vec<&str> = slots.iter().copied().filter(mergeable).collect();
        let pooled: ValueSet = [keep, other]
            .iter()
            .flat_map(|record| slots.iter().map(move |slot| record.property(slot)))
            .filter(|value| !value.is_empty())
            .collect();
        let values = pooled.as_slice();

        for (index, slot) in slots.iter().enumerate() {
            match values.get(index) {
                Some(value) => {
                    fields.insert(slot.to_string(), value.clone());
                }
                None if !keep.property(slot).is_empty() => {
                    fields.insert(slot.to_string(), String::new());
                }
                None => {}
            }
        }
        if values.len() > slots.len() {
            notes.push(format!("{}: {}", label, values[slots.len()..].join(", ")));
        }
        handled.extend(slots);
    }

    let remaining: BTreeSet<&str> = keep
        .field_names()
        .chain(other.field_names())
        .filter(mergeable)
        .filter(|field| !handled.contains(field))
        .collect();
    let mut displaced = Vec::new();
    for field in remaining {
        let (chosen, loser) = choose(field, keep.property(field), other.property(field));
        if let Some(loser) = loser {
            displaced.push(format!("{}: {}", field, loser));
        }
        if !chosen.is_empty() {
            fields.insert(field.to_string(), chosen);
        }
    }
    if !displaced.is_empty() {
        notes.push(format!("{}: {}", DISPLACED_LABEL, displaced.join(", ")));
    }

    let mut blocks = Vec::new();
    let (keep_notes, other_notes) = (keep.property(NOTES), other.property(NOTES));
    if !keep_notes.trim().is_empty() {
        blocks.push(keep_notes.clone());
    }
    if !other_notes.trim().is_empty() && other_notes != keep_notes {
        blocks.push(other_notes);
    }
    blocks.extend(notes);
    let merged_notes = blocks.join(NOTES_SEPARATOR).trim().to_string();
    if !merged_notes.is_empty() {
        fields.insert(NOTES.to_string(), merged_notes);
    }

    MergeResult { fields }
}

/// Picks the merged value of a single field and the value it displaces.
///
/// Selection and numeric values are settings rather than data and are never
/// reported as displaced.
fn choose(field: &str, mine: String, theirs: String) -> (String, Option<String>) {
    let category = classify(field);
    if mine.is_empty() || theirs.is_empty() || mine == theirs {
        return (if mine.is_empty() { theirs } else { mine }, None);
    }

    if category.is_text() {
        let (winner, loser) = if theirs.chars().count() > mine.chars().count() {
            (theirs, mine)
        } else {
            (mine, theirs)
        };
        let displaced = (!winner.contains(&loser)).then_some(loser);
        return (winner, displaced);
    }

    let default = category.default_value();
    let is_set = |value: &str| value != default && value != "0";
    match (is_set(mine.as_str()), is_set(theirs.as_str())) {
        (false, true) => (theirs, None),
        (true, true) if !matches!(category, FieldCategory::Selection | FieldCategory::Numeric) => {
            (mine, Some(theirs))
        }
        _ => (mine, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_longer_text() {
        assert_eq!(
            choose("Company", "Acme".into(), "Acme Inc".into()),
            ("Acme Inc".to_string(), None)
        );
        assert_eq!(
            choose("Company", "Acme".into(), "Initech".into()),
            ("Initech".to_string(), Some("Acme".to_string()))
        );
    }

    #[test]
    fn test_choose_prefers_non_default_selection() {
        assert_eq!(
            choose("PreferMailFormat", "0".into(), "2".into()),
            ("2".to_string(), None)
        );
        assert_eq!(
            choose("PreferMailFormat", "1".into(), "2".into()),
            ("1".to_string(), None)
        );
    }

    #[test]
    fn test_choose_other_reports_conflict() {
        assert_eq!(
            choose("BirthYear", "1980".into(), "1981".into()),
            ("1980".to_string(), Some("1981".to_string()))
        );
    }
}
