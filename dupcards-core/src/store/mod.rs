// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Stores
//!
//! The host contact store seam and two implementations: an in-process
//! store for tests and tooling, and a SQLite-backed store.

mod error;
mod memory;
pub mod migration;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::{BookInfo, SqliteStore};

use async_trait::async_trait;

use crate::card::{is_virtual, FieldMap, Record};

/// Host contact store.
///
/// Calls are awaited one at a time; implementations need no ordering
/// guarantees beyond that.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lists all records of an address book, in a stable order.
    async fn list(&self, book: &str) -> Result<Vec<Record>, StoreError>;

    /// Applies a field map to a record as a whole. Empty values clear fields.
    async fn update(&self, record_id: &str, fields: &FieldMap) -> Result<(), StoreError>;

    /// Deletes a record.
    async fn delete(&self, record_id: &str) -> Result<(), StoreError>;
}

/// Rejects updates that carry derived `__` fields.
pub(crate) fn check_update(record_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
    match fields.keys().find(|field| is_virtual(field)) {
        Some(field) => Err(StoreError::UpdateFailed {
            record_id: record_id.to_string(),
            reason: format!("derived field {} cannot be stored", field),
        }),
        None => Ok(()),
    }
}
