// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite-backed record store.
//!
//! Cards are kept as JSON field maps, one row per card, grouped into named
//! address books. Preferences live in a key/value `settings` table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::migration::{self, unix_now, MigrationRunner};
use super::{check_update, RecordStore, StoreError};
use crate::card::{FieldMap, FieldValue, Record};
use crate::preferences::{PreferenceBag, PreferenceStore};

/// An address book and its size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    pub name: String,
    pub cards: usize,
}

/// SQLite contact store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        MigrationRunner::run(&conn, &migration::all_migrations())?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        MigrationRunner::current_version(&*self.lock()?)
    }

    /// Creates an address book. Returns false if it already exists.
    pub fn create_book(&self, name: &str) -> Result<bool, StoreError> {
        let created = self.lock()?.execute(
            "INSERT OR IGNORE INTO books (name, created_at) VALUES (?1, ?2)",
            params![name, unix_now()],
        )?;
        Ok(created > 0)
    }

    /// Lists address books with their card counts.
    pub fn list_books(&self) -> Result<Vec<BookInfo>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT b.name, COUNT(c.id) FROM books b
             LEFT JOIN cards c ON c.book = b.name
             GROUP BY b.name ORDER BY b.name",
        )?;
        let books = stmt
            .query_map([], |row| {
                Ok(BookInfo {
                    name: row.get(0)?,
                    cards: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// Adds one record to an existing book and returns its id.
    pub fn insert_record(&self, book: &str, record: &Record) -> Result<String, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        require_book(&tx, book)?;
        let id = insert_card(&tx, book, record)?;
        tx.commit()?;
        Ok(id)
    }

    /// Imports a JSON array of records into a book, creating the book if
    /// needed. Returns the number of records imported.
    ///
    /// Records without an id get a fresh one; the whole import lands or
    /// nothing does.
    pub fn import_records(&self, book: &str, json: &str) -> Result<usize, StoreError> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO books (name, created_at) VALUES (?1, ?2)",
            params![book, unix_now()],
        )?;
        for record in &records {
            insert_card(&tx, book, record)?;
        }
        tx.commit()?;
        debug!(book, count = records.len(), "imported records");
        Ok(records.len())
    }

    /// Exports a book as a pretty-printed JSON array of records.
    pub fn export_book(&self, book: &str) -> Result<String, StoreError> {
        let records = self.load_book(book)?;
        Ok(serde_json::to_string_pretty(&records)?)
    }

    fn load_book(&self, book: &str) -> Result<Vec<Record>, StoreError> {
        let conn = self.lock()?;
        require_book(&conn, book)?;
        let mut stmt = conn.prepare("SELECT id, fields FROM cards WHERE book = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(params![book], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, fields)| -> Result<Record, StoreError> {
                let fields: BTreeMap<String, FieldValue> = serde_json::from_str(&fields)?;
                Ok(Record::from_parts(&id, book, fields))
            })
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))
    }

    fn update_card(&self, record_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let stored: Option<(String, String)> = tx
            .query_row(
                "SELECT book, fields FROM cards WHERE id = ?1",
                params![record_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((book, json)) = stored else {
            return Err(StoreError::UpdateFailed {
                record_id: record_id.to_string(),
                reason: "no such record".into(),
            });
        };

        let mut record = Record::from_parts(record_id, &book, serde_json::from_str(&json)?);
        record.apply(fields);
        tx.execute(
            "UPDATE cards SET fields = ?1, updated_at = ?2 WHERE id = ?3",
            params![serde_json::to_string(record.fields())?, unix_now(), record_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn require_book(conn: &Connection, book: &str) -> Result<(), StoreError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM books WHERE name = ?1",
        params![book],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::NotFound(book.to_string()))
    }
}

fn insert_card(conn: &Connection, book: &str, record: &Record) -> Result<String, StoreError> {
    let id = if record.id().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        record.id().to_string()
    };
    conn.execute(
        "INSERT INTO cards (id, book, fields, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, book, serde_json::to_string(record.fields())?, unix_now()],
    )?;
    Ok(id)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list(&self, book: &str) -> Result<Vec<Record>, StoreError> {
        self.load_book(book)
    }

    async fn update(&self, record_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
        check_update(record_id, fields)?;
        self.update_card(record_id, fields)
            .map_err(|err| match err {
                StoreError::UpdateFailed { .. } => err,
                other => StoreError::UpdateFailed {
                    record_id: record_id.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    async fn delete(&self, record_id: &str) -> Result<(), StoreError> {
        let deleted = self
            .lock()?
            .execute("DELETE FROM cards WHERE id = ?1", params![record_id])
            .map_err(|err| StoreError::DeleteFailed {
                record_id: record_id.to_string(),
                reason: err.to_string(),
            })?;
        if deleted == 0 {
            return Err(StoreError::DeleteFailed {
                record_id: record_id.to_string(),
                reason: "no such record".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn get_all(&self) -> Result<PreferenceBag, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut bag = PreferenceBag::new();
        for (key, value) in rows {
            bag.insert(key, serde_json::from_str(&value)?);
        }
        Ok(bag)
    }

    async fn set_all(&self, bag: PreferenceBag) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM settings", [])?;
        for (key, value) in &bag {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)",
                params![key, serde_json::to_string(value)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
