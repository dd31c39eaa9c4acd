// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Books Command
//!
//! List and create address books.

use anyhow::{bail, Result};

use crate::config::CliConfig;
use crate::display;

/// Lists all address books.
pub fn list(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let books = store.list_books()?;

    if books.is_empty() {
        display::info("No address books yet. Create one with:");
        println!("  dupcards books create <name>");
        return Ok(());
    }

    println!();
    println!("Address books ({}):", books.len());
    println!();
    display::display_books_table(&books);
    println!();

    Ok(())
}

/// Creates an empty address book.
pub fn create(config: &CliConfig, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Book name cannot be empty");
    }

    let store = config.open_store()?;
    if store.create_book(name)? {
        display::success(&format!("Created address book '{}'", name));
    } else {
        display::warning(&format!("Address book '{}' already exists", name));
    }

    Ok(())
}
