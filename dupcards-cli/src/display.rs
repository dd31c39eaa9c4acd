// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Helpers
//!
//! Terminal output formatting for the CLI.

use std::collections::BTreeSet;

use console::style;
use dupcards_core::card::is_virtual;
use dupcards_core::{
    BookInfo, Completeness, Comparison, MergeResult, Record, ScanSummary, Side,
};
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "Book")]
    name: String,
    #[tabled(rename = "Cards")]
    cards: usize,
}

/// Displays address books as a table.
pub fn display_books_table(books: &[BookInfo]) {
    let rows = books.iter().map(|book| BookRow {
        name: book.name.clone(),
        cards: book.cards,
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct PreferenceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Displays preference keys and their values.
pub fn display_preferences_table(entries: &[(&str, String)]) {
    let rows = entries.iter().map(|(key, value)| PreferenceRow {
        key: key.to_string(),
        value: if value.is_empty() {
            "(unset)".to_string()
        } else {
            value.clone()
        },
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Second")]
    second: String,
    #[tabled(rename = "Merged")]
    merged: String,
}

/// Renders a duplicate pair side by side with the merge that keeping
/// `keep` would produce.
///
/// Fields empty on both sides are left out; differing rows are marked.
pub fn pair_table(first: &Record, second: &Record, merged: &MergeResult, keep: Side) -> String {
    let kept = match keep {
        Side::First => first,
        Side::Second => second,
    };
    let fields: BTreeSet<&str> = first
        .field_names()
        .chain(second.field_names())
        .chain(merged.fields().keys().map(String::as_str))
        .filter(|field| !is_virtual(field))
        .collect();

    let rows = fields.into_iter().filter_map(|field| {
        let a = first.property(field);
        let b = second.property(field);
        let m = merged
            .get(field)
            .map(str::to_string)
            .unwrap_or_else(|| kept.property(field));
        if a.is_empty() && b.is_empty() && m.is_empty() {
            return None;
        }
        let name = if a == b {
            field.to_string()
        } else {
            format!("* {}", field)
        };
        Some(PairRow {
            field: name,
            first: a,
            second: b,
            merged: m,
        })
    });
    let caption = match keep {
        Side::First => "Merged: keep first, merge second into it",
        Side::Second => "Merged: keep second, merge first into it",
    };
    Table::new(rows)
        .with(Panel::header(caption))
        .with(Style::modern())
        .to_string()
}

/// Describes which side holds more information.
pub fn describe_comparison(comparison: &Comparison) -> String {
    let relation = match comparison.completeness {
        Completeness::LessComplete => "second record is more complete",
        Completeness::MoreComplete => "first record is more complete",
        Completeness::Equivalent => "records hold the same information",
        Completeness::Incomparable => "each record holds something the other lacks",
    };
    let removal = if comparison.prefers_removing_first() {
        "first"
    } else {
        "second"
    };
    format!("{}; suggest removing the {}", relation, removal)
}

/// Displays the end-of-session statistics.
pub fn display_summary(summary: &ScanSummary) {
    println!();
    println!("  {}", style("Scan summary").bold().cyan());
    println!("  Cards before:           {}", summary.before);
    println!("  Cards after:            {}", summary.after);
    println!("  Removed manually:       {}", summary.removed_manually);
    println!("  Removed automatically:  {}", summary.removed_automatically);
    println!("  Changed:                {}", summary.changed);
    println!("  Skipped:                {}", summary.skipped);
    println!();
}
