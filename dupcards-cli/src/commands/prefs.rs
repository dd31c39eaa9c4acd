// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Preferences Command
//!
//! Shows and edits the stored duplicate detection preferences.

use anyhow::Result;
use dupcards_core::preferences::PREFERENCE_KEYS;
use dupcards_core::{load_preferences, save_preferences, Preferences};

use crate::config::CliConfig;
use crate::display;

/// Shows every preference with its current value.
pub async fn show(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let prefs = load_preferences(&store).await?;

    let entries: Vec<(&str, String)> = PREFERENCE_KEYS
        .iter()
        .map(|key| (*key, prefs.get(key).unwrap_or_default()))
        .collect();

    println!();
    display::display_preferences_table(&entries);
    println!();

    Ok(())
}

/// Sets one preference and saves.
pub async fn set(config: &CliConfig, key: &str, value: &str) -> Result<()> {
    let store = config.open_store()?;
    let mut prefs = load_preferences(&store).await?;

    prefs.set(key, value)?;
    save_preferences(&store, &prefs).await?;

    let shown = prefs.get(key).unwrap_or_default();
    display::success(&format!("{} = {}", key, shown));
    Ok(())
}

/// Restores every preference to its default.
pub async fn reset(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    save_preferences(&store, &Preferences::default()).await?;

    display::success("Preferences reset to defaults");
    Ok(())
}
