// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Record builders and preloaded stores.

use dupcards_core::card::field::{
    DISPLAY_NAME, FIRST_NAME, LAST_NAME, PRIMARY_EMAIL, SECOND_EMAIL,
};
use dupcards_core::{MemoryStore, Record};

/// Builds a record from `(field, value)` pairs.
pub fn record(id: &str, fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .fold(Record::new(id, ""), |record, (field, value)| {
            record.with_field(field, *value)
        })
}

/// A record with first name, last name and primary email.
pub fn person(id: &str, first: &str, last: &str, email: &str) -> Record {
    record(
        id,
        &[(FIRST_NAME, first), (LAST_NAME, last), (PRIMARY_EMAIL, email)],
    )
}

/// A record with only a display name.
pub fn displayed(id: &str, display: &str) -> Record {
    record(id, &[(DISPLAY_NAME, display)])
}

/// A record with two email addresses and nothing else.
pub fn mailbox(id: &str, primary: &str, second: &str) -> Record {
    record(id, &[(PRIMARY_EMAIL, primary), (SECOND_EMAIL, second)])
}

/// A memory store holding one book with the given records.
pub fn store_with(book: &str, records: Vec<Record>) -> MemoryStore {
    let store = MemoryStore::new();
    store.add_book(book).unwrap();
    for record in records {
        store.insert(book, record).unwrap();
    }
    store
}
