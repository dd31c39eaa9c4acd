// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Store error types.

use thiserror::Error;

/// Record and preference store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Address book not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to update record {record_id}: {reason}")]
    UpdateFailed { record_id: String, reason: String },

    #[error("Failed to delete record {record_id}: {reason}")]
    DeleteFailed { record_id: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
