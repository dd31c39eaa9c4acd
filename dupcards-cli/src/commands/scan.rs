// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scan Command
//!
//! Runs a duplicate scan with a progress bar, then reviews the queued pairs.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Select};
use dupcards_core::{
    load_preferences, CallbackHandler, RecordStore, ScanDriver, ScanEvent, ScanState, Side,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::CliConfig;
use crate::display;

/// Flags that adjust a single scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanArgs {
    /// Overrides the stored auto-remove preference when set.
    pub auto_remove: bool,
    pub preserve_first: bool,
    pub interactive: bool,
}

const ACTIONS: [&str; 5] = [
    "Keep first, merge second into it",
    "Keep second, merge first into it",
    "Skip this pair",
    "Back to previous pair",
    "Stop reviewing",
];

/// Scans one book, or two books against each other.
pub async fn run(
    config: &CliConfig,
    book: &str,
    second_book: Option<&str>,
    args: ScanArgs,
) -> Result<()> {
    let store = config.open_store()?;
    let mut prefs = load_preferences(&store).await?;
    if args.auto_remove {
        prefs.auto_remove_duplicates = true;
    }
    if args.preserve_first {
        prefs.preserve_first_on_auto_remove = true;
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pairs")?
            .progress_chars("=> "),
    );
    bar.set_message("Scanning");

    let progress = bar.clone();
    let handler = Arc::new(CallbackHandler::new(move |event: ScanEvent| match event {
        ScanEvent::Progress { checked, total } => {
            progress.set_length(total);
            progress.set_position(checked);
        }
        ScanEvent::AutoRemoved { record_id, .. } => {
            progress.println(format!("  removed {}", record_id));
        }
        _ => {}
    }));

    let mut driver = ScanDriver::new(&store, prefs).with_handler(handler);

    let stop = driver.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });
    let result = driver.run(book, second_book).await;
    interrupt.abort();
    bar.finish_and_clear();
    let state = result?;

    if state == ScanState::AwaitingReview {
        let found = driver.queued().len();
        display::info(&format!("Found {} duplicate pair(s)", found));
        if args.interactive {
            review(&mut driver).await?;
        } else {
            list_pairs(&driver);
            driver.stop();
        }
    } else {
        display::success("No duplicates left to review");
    }

    display::display_summary(&driver.summary());
    Ok(())
}

// Prints every queued pair whose records are both still present.
fn list_pairs<S: RecordStore + ?Sized>(driver: &ScanDriver<'_, S>) {
    println!();
    for (n, pair) in driver.queued().iter().enumerate() {
        let (Some(first), Some(second)) = (
            driver.record(Side::First, pair.first),
            driver.record(Side::Second, pair.second),
        ) else {
            continue;
        };
        println!(
            "  {}. {}  {}  {}  ({})",
            n + 1,
            style(first.label()).bold(),
            style("<->").dim(),
            style(second.label()).bold(),
            pair.reason
        );
    }
    println!();
}

fn action_index(keep: Side) -> usize {
    match keep {
        Side::First => 0,
        Side::Second => 1,
    }
}

/// Renders the current pair with the merge that keeping `keep` produces.
fn preview<S: RecordStore + ?Sized>(driver: &ScanDriver<'_, S>, keep: Side) -> Result<String> {
    let (first, second) = driver.current_pair()?;
    let merged = driver.preview_merge(keep)?;
    Ok(display::pair_table(first, second, &merged, keep))
}

async fn review<S: RecordStore + ?Sized>(driver: &mut ScanDriver<'_, S>) -> Result<()> {
    while driver.state() == ScanState::AwaitingReview {
        let Some(pair) = driver.current() else {
            break;
        };
        let position = driver.position().unwrap_or(0);
        let total = driver.queued().len();

        let (first, second) = driver.current_pair()?;
        let comparison = driver.compare_current()?;
        let suggested = if comparison.prefers_removing_first() {
            Side::Second
        } else {
            Side::First
        };

        println!();
        println!(
            "  {} {} and {}, matched by {}",
            style(format!("[{}/{}]", position + 1, total)).dim(),
            style(first.label()).bold().cyan(),
            style(second.label()).bold().cyan(),
            pair.reason
        );
        println!("{}", preview(driver, suggested)?);
        display::info(&display::describe_comparison(&comparison));

        let selection = Select::new()
            .with_prompt("Action")
            .items(&ACTIONS)
            .default(action_index(suggested))
            .interact()?;

        match selection {
            0 | 1 => {
                let keep = if selection == 0 {
                    Side::First
                } else {
                    Side::Second
                };
                if keep != suggested {
                    println!("{}", preview(driver, keep)?);
                }
                let confirmed = Confirm::new()
                    .with_prompt("Apply this merge?")
                    .default(true)
                    .interact()?;
                if !confirmed {
                    continue;
                }
                match driver.apply(keep).await {
                    Ok(_) => display::success("Merged and removed the duplicate"),
                    Err(err) => display::error(&format!("Merge failed: {}", err)),
                }
            }
            2 => {
                driver.advance()?;
            }
            3 => {
                if !driver.retreat()? {
                    display::warning("No earlier pair to go back to");
                }
            }
            _ => driver.stop(),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupcards_core::{MemoryStore, Preferences, Record};

    fn company_pair() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_book("main").unwrap();
        for (id, company) in [("1", "Acme"), ("2", "Bolt")] {
            let record = Record::new(id, "")
                .with_field("DisplayName", "Jane Doe")
                .with_field("Company", company);
            store.insert("main", record).unwrap();
        }
        store
    }

    /// Cells of the table row for `field`.
    fn row_cells(table: &str, field: &str) -> Vec<String> {
        let line = table
            .lines()
            .find(|line| line.contains(field))
            .unwrap();
        line.split('│')
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect()
    }

    #[tokio::test]
    async fn test_preview_follows_kept_side() {
        let store = company_pair();
        let mut driver = ScanDriver::new(&store, Preferences::default());
        assert_eq!(
            driver.run("main", None).await.unwrap(),
            ScanState::AwaitingReview
        );

        let first = preview(&driver, Side::First).unwrap();
        assert_eq!(row_cells(&first, "Company"), ["* Company", "Acme", "Bolt", "Acme"]);
        assert!(first.contains("keep first"));

        let second = preview(&driver, Side::Second).unwrap();
        assert_eq!(row_cells(&second, "Company"), ["* Company", "Acme", "Bolt", "Bolt"]);
        assert!(second.contains("keep second"));
    }

    #[test]
    fn test_action_index_matches_keep_actions() {
        assert!(ACTIONS[action_index(Side::First)].starts_with("Keep first"));
        assert!(ACTIONS[action_index(Side::Second)].starts_with("Keep second"));
    }
}
