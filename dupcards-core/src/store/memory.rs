// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-process record store.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{check_update, RecordStore, StoreError};
use crate::card::{FieldMap, Record};
use crate::preferences::{PreferenceBag, PreferenceStore};

#[derive(Default)]
struct Inner {
    books: BTreeMap<String, Vec<Record>>,
    preferences: PreferenceBag,
    failing_updates: HashSet<String>,
    failing_deletes: HashSet<String>,
}

/// Record and preference store held in memory.
///
/// Update and delete failures can be injected per record.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates an empty address book. Existing books are left alone.
    pub fn add_book(&self, book: &str) -> Result<(), StoreError> {
        self.lock()?.books.entry(book.to_string()).or_default();
        Ok(())
    }

    /// Appends a record to a book, creating the book if needed.
    ///
    /// A record without an id gets a fresh one.
    pub fn insert(&self, book: &str, mut record: Record) -> Result<(), StoreError> {
        record.set_book(book);
        if record.id().is_empty() {
            record.set_id(&Uuid::new_v4().to_string());
        }
        self.lock()?
            .books
            .entry(book.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Returns a snapshot of a book.
    pub fn records(&self, book: &str) -> Result<Vec<Record>, StoreError> {
        self.lock()?
            .books
            .get(book)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(book.to_string()))
    }

    /// Returns a record by id.
    pub fn record(&self, record_id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .lock()?
            .books
            .values()
            .flatten()
            .find(|record| record.id() == record_id)
            .cloned())
    }

    /// Makes every later update of the record fail.
    pub fn fail_updates_of(&self, record_id: &str) -> Result<(), StoreError> {
        self.lock()?.failing_updates.insert(record_id.to_string());
        Ok(())
    }

    /// Makes every later delete of the record fail.
    pub fn fail_deletes_of(&self, record_id: &str) -> Result<(), StoreError> {
        self.lock()?.failing_deletes.insert(record_id.to_string());
        Ok(())
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.failing_updates.clear();
        inner.failing_deletes.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, book: &str) -> Result<Vec<Record>, StoreError> {
        self.records(book)
    }

    async fn update(&self, record_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
        check_update(record_id, fields)?;
        let mut inner = self.lock()?;
        if inner.failing_updates.contains(record_id) {
            return Err(StoreError::UpdateFailed {
                record_id: record_id.to_string(),
                reason: "injected failure".into(),
            });
        }
        let record = inner
            .books
            .values_mut()
            .flatten()
            .find(|record| record.id() == record_id)
            .ok_or_else(|| StoreError::UpdateFailed {
                record_id: record_id.to_string(),
                reason: "no such record".into(),
            })?;
        record.apply(fields);
        Ok(())
    }

    async fn delete(&self, record_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.failing_deletes.contains(record_id) {
            return Err(StoreError::DeleteFailed {
                record_id: record_id.to_string(),
                reason: "injected failure".into(),
            });
        }
        for records in inner.books.values_mut() {
            if let Some(index) = records.iter().position(|r| r.id() == record_id) {
                records.remove(index);
                return Ok(());
            }
        }
        Err(StoreError::DeleteFailed {
            record_id: record_id.to_string(),
            reason: "no such record".into(),
        })
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get_all(&self) -> Result<PreferenceBag, StoreError> {
        Ok(self.lock()?.preferences.clone())
    }

    async fn set_all(&self, bag: PreferenceBag) -> Result<(), StoreError> {
        self.lock()?.preferences = bag;
        Ok(())
    }
}
