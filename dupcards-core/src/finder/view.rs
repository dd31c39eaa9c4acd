// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Comparable views of records and their cache.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::card::field::{
    DISPLAY_NAME, EMAIL_FIELDS, FIRST_NAME, LAST_NAME, MATCHED_PHONE_FIELDS, PRIMARY_EMAIL,
    SCREEN_NAME, SECOND_EMAIL,
};
use crate::card::{CardError, Record};
use crate::normalize::Normalizer;

static TWO_WORD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_\x{80}-\x{FFFF}]+)\s+([A-Za-z0-9_\x{80}-\x{FFFF}]+)\s*$").unwrap()
});
static SEPARATED_EMAIL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9\x{80}-\x{FFFF}]+)[.\-_]+([A-Za-z0-9\x{80}-\x{FFFF}]+)@").unwrap()
});
static CAMEL_CASE_EMAIL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z][a-z0-9_\x{80}-\x{FFFF}]*)([A-Z][a-z0-9_\x{80}-\x{FFFF}]*)@").unwrap()
});

/// Canonical projection of a record used by the matcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparableView {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub screen_name: String,
    pub primary_email: String,
    pub second_email: String,
    /// Cellular, pager and work numbers.
    pub phones: [String; 3],
}

impl ComparableView {
    /// Returns true if no name of any kind is known.
    pub fn has_no_names(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.display_name.is_empty()
            && self.screen_name.is_empty()
    }

    /// Returns true if no email or matched phone number is known.
    pub fn has_no_contact_points(&self) -> bool {
        self.primary_email.is_empty()
            && self.second_email.is_empty()
            && self.phones.iter().all(String::is_empty)
    }

    pub fn emails(&self) -> [&str; 2] {
        [&self.primary_email, &self.second_email]
    }
}

/// Builds the comparable view of a record.
///
/// Fails if one of the fields it reads holds a set.
pub fn simplify(normalizer: &Normalizer, record: &Record) -> Result<ComparableView, CardError> {
    for field in [FIRST_NAME, LAST_NAME, DISPLAY_NAME, SCREEN_NAME]
        .iter()
        .chain(EMAIL_FIELDS.iter())
        .chain(MATCHED_PHONE_FIELDS.iter())
    {
        record.scalar(field)?;
    }

    let (first_name, last_name, display_name) = complete_names(
        normalizer,
        record,
        normalizer.canonical(record, FIRST_NAME),
        normalizer.canonical(record, LAST_NAME),
        normalizer.canonical(record, DISPLAY_NAME),
    );
    let [cell, pager, work] = MATCHED_PHONE_FIELDS.map(|f| normalizer.canonical(record, f));

    Ok(ComparableView {
        first_name,
        last_name,
        display_name,
        screen_name: normalizer.canonical(record, SCREEN_NAME),
        primary_email: normalizer.canonical(record, PRIMARY_EMAIL),
        second_email: normalizer.canonical(record, SECOND_EMAIL),
        phones: [cell, pager, work],
    })
}

/// Fills in missing first, last and display names from each other or from
/// the local part of an email address.
fn complete_names(
    normalizer: &Normalizer,
    record: &Record,
    mut first: String,
    mut last: String,
    mut display: String,
) -> (String, String, String) {
    if display.is_empty() && !first.is_empty() && !last.is_empty() {
        display = format!("{} {}", first, last);
    } else if first.is_empty() || last.is_empty() || display.is_empty() {
        let parts = name_parts(&TWO_WORD_NAME, &display).or_else(|| {
            EMAIL_FIELDS
                .iter()
                .find_map(|email| email_name_parts(&normalizer.pruned(record, email)))
        });
        if let Some((given, family)) = parts {
            if first.is_empty() {
                first = normalizer.abstract_text(&strip_digits(&given), FIRST_NAME);
            }
            if last.is_empty() {
                last = normalizer.abstract_text(&strip_digits(&family), LAST_NAME);
            }
            if display.is_empty() {
                display = format!("{} {}", first, last).trim().to_string();
            }
        }
    }
    (first, last, display)
}

/// Extracts a name from addresses like `jane.doe@`, `jane_doe@` or `JaneDoe@`.
///
/// Local parts whose first word is "no" (`no-reply@`, `NoReply@`) are skipped.
fn email_name_parts(email: &str) -> Option<(String, String)> {
    let is_real = |(given, _): &(String, String)| !given.eq_ignore_ascii_case("no");
    name_parts(&SEPARATED_EMAIL_NAME, email)
        .filter(is_real)
        .or_else(|| name_parts(&CAMEL_CASE_EMAIL_NAME, email).filter(is_real))
}

fn name_parts(pattern: &Regex, text: &str) -> Option<(String, String)> {
    pattern
        .captures(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

fn strip_digits(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_digit()).collect()
}

/// Comparable views keyed by record identity and revision.
///
/// A cached view is reused only while the record's revision is unchanged,
/// so local mutations can never leave a stale view behind.
#[derive(Debug, Default)]
pub struct ViewCache {
    views: HashMap<(String, String), (u64, Arc<ComparableView>)>,
}

impl ViewCache {
    pub fn new() -> Self {
        ViewCache {
            views: HashMap::new(),
        }
    }

    /// Returns the view of a record, building it on first use.
    pub fn get_or_build(
        &mut self,
        normalizer: &Normalizer,
        record: &Record,
    ) -> Result<Arc<ComparableView>, CardError> {
        let key = (record.book().to_string(), record.id().to_string());
        if let Some((revision, view)) = self.views.get(&key) {
            if *revision == record.revision() {
                return Ok(Arc::clone(view));
            }
        }
        let view = Arc::new(simplify(normalizer, record)?);
        self.views
            .insert(key, (record.revision(), Arc::clone(&view)));
        Ok(view)
    }

    /// Discards the view of a record.
    pub fn invalidate(&mut self, book: &str, record_id: &str) {
        self.views
            .remove(&(book.to_string(), record_id.to_string()));
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_name_parts() {
        assert_eq!(
            email_name_parts("jane.doe@example.com"),
            Some(("jane".into(), "doe".into()))
        );
        assert_eq!(
            email_name_parts("JaneDoe@example.com"),
            Some(("Jane".into(), "Doe".into()))
        );
        assert_eq!(email_name_parts("no-reply@example.com"), None);
        assert_eq!(email_name_parts("NoReply@example.com"), None);
        assert_eq!(email_name_parts("jane@example.com"), None);
    }

    #[test]
    fn test_strip_digits() {
        assert_eq!(strip_digits("jane42"), "jane");
    }
}
