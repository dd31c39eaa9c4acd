// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dupcards_core::SqliteStore;
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for storage.
    pub data_dir: PathBuf,
}

impl CliConfig {
    /// Uses the given directory, or the platform data directory.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dupcards")
        });
        CliConfig { data_dir }
    }

    /// Returns the path of the contact database.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("contacts.db")
    }

    /// Opens the contact database, creating the data directory if needed.
    pub fn open_store(&self) -> Result<SqliteStore> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })?;
        debug!(path = %self.storage_path().display(), "opening contact database");
        let store = SqliteStore::open(self.storage_path())
            .with_context(|| format!("Failed to open {}", self.storage_path().display()))?;
        Ok(store)
    }
}
