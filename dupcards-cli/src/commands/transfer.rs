// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Import and Export Commands
//!
//! Moves records between JSON files and the contact database.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::CliConfig;
use crate::display;

/// Imports a JSON array of records into a book.
pub fn import(config: &CliConfig, book: &str, input: &Path) -> Result<()> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let store = config.open_store()?;
    let count = store
        .import_records(book, &json)
        .with_context(|| format!("Failed to import {}", input.display()))?;

    display::success(&format!("Imported {} record(s) into '{}'", count, book));
    Ok(())
}

/// Exports a book as JSON, to a file or stdout.
pub fn export(config: &CliConfig, book: &str, output: Option<&Path>) -> Result<()> {
    let store = config.open_store()?;
    let json = store.export_book(book)?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            display::success(&format!("Exported '{}' to {}", book, path.display()));
        }
        None => println!("{}", json),
    }

    Ok(())
}
