// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.
//! Import these in property test files to avoid duplication.

use proptest::prelude::*;

use dupcards_core::card::field::{
    CUSTOM_FIELDS, DISPLAY_NAME, EMAIL_FIELDS, FIRST_NAME, LAST_NAME, NOTES, PHONE_FIELDS,
    POPULARITY_INDEX, WEB_PAGE_FIELDS,
};
use dupcards_core::Record;

// ============================================================
// String Strategies
// ============================================================

/// Strategy for generating names (one or two capitalized words).
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,9}( [A-Z][a-z]{1,9})?"
}

/// Strategy for generating free text with punctuation and accents.
pub fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 äöüéèßÆ.,;:!?'_&+-]{0,40}"
}

/// Strategy for generating email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{3,10}", "[a-z]{2,8}", "[a-z]{2,4}")
        .prop_map(|(user, domain, tld)| format!("{}@{}.{}", user, domain, tld))
}

/// Strategy for generating phone numbers in assorted notations.
pub fn phone_strategy() -> impl Strategy<Value = String> {
    ("(\\+|00|0)?", "[0-9]{2,4}", "[ ./-]?", "[0-9]{4,8}")
        .prop_map(|(prefix, area, sep, number)| format!("{}{}{}{}", prefix, area, sep, number))
}

/// Strategy for generating URLs.
pub fn url_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{3,10}", "[a-z]{2,4}")
        .prop_map(|(domain, tld)| format!("https://{}.{}", domain, tld))
}

// ============================================================
// Record Strategies
// ============================================================

/// Selection field carried by generated records.
pub const MAIL_FORMAT: &str = "PreferMailFormat";

/// Strategy for generating a record with names, slot values, notes and a
/// selection and numeric setting.
///
/// Slots are filled sparsely so that merges exercise both free and
/// overflowing slots.
pub fn record_strategy(id: &'static str) -> impl Strategy<Value = Record> {
    (
        prop::option::of(name_strategy()),
        prop::option::of(name_strategy()),
        prop::option::of(name_strategy()),
        prop::collection::vec(prop::option::of(email_strategy()), EMAIL_FIELDS.len()),
        prop::collection::vec(prop::option::of(phone_strategy()), PHONE_FIELDS.len()),
        prop::collection::vec(prop::option::of(url_strategy()), WEB_PAGE_FIELDS.len()),
        prop::collection::vec(prop::option::of("[a-z]{1,8}"), CUSTOM_FIELDS.len()),
        prop::option::of(text_strategy()),
        prop::option::of(prop_oneof![Just("0"), Just("1"), Just("2")]),
        prop::option::of(0i64..1000),
    )
        .prop_map(
            move |(first, last, display, emails, phones, pages, customs, notes, format, popularity)| {
                let mut record = Record::new(id, "");
                let named = [(FIRST_NAME, first), (LAST_NAME, last), (DISPLAY_NAME, display)];
                for (field, value) in named {
                    if let Some(value) = value {
                        record.set(field, value);
                    }
                }
                let slots = EMAIL_FIELDS
                    .iter()
                    .zip(emails)
                    .chain(PHONE_FIELDS.iter().zip(phones))
                    .chain(WEB_PAGE_FIELDS.iter().zip(pages))
                    .chain(CUSTOM_FIELDS.iter().zip(customs));
                for (field, value) in slots {
                    if let Some(value) = value {
                        record.set(field, value);
                    }
                }
                if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
                    record.set(NOTES, notes);
                }
                if let Some(format) = format {
                    record.set(MAIL_FORMAT, format);
                }
                if let Some(popularity) = popularity {
                    record.set(POPULARITY_INDEX, popularity);
                }
                record
            },
        )
}
