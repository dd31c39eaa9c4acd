// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dupcards CLI
//!
//! Command-line interface for finding and merging duplicate contacts.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "dupcards")]
#[command(version, about = "Find and merge duplicate contacts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform data dir/dupcards)
    #[arg(long, global = true, env = "DUPCARDS_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage address books
    #[command(subcommand)]
    Books(BookCommands),

    /// Import records from a JSON file into a book
    Import {
        /// Target address book (created if missing)
        book: String,

        /// JSON file holding an array of records
        input: PathBuf,
    },

    /// Export a book as JSON
    Export {
        /// Address book to export
        book: String,

        /// Output file path (default: stdout)
        output: Option<PathBuf>,
    },

    /// Show or change duplicate detection preferences
    #[command(subcommand)]
    Prefs(PrefCommands),

    /// Scan for duplicates and review them
    Scan {
        /// Address book to scan
        book: String,

        /// Second address book to compare against the first
        second_book: Option<String>,

        /// Remove the less complete record of a pair without asking
        #[arg(long)]
        auto_remove: bool,

        /// Never auto-remove records of the first book
        #[arg(long)]
        preserve_first: bool,

        /// List the pairs found instead of reviewing them
        #[arg(long)]
        non_interactive: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BookCommands {
    /// List address books
    List,

    /// Create an empty address book
    Create {
        /// Book name
        name: String,
    },
}

#[derive(Subcommand)]
enum PrefCommands {
    /// Show all preferences
    Show,

    /// Set one preference
    Set {
        /// Preference key, e.g. autoRemoveDuplicates
        key: String,

        /// New value; lists are comma separated
        value: String,
    },

    /// Restore the defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dupcards_core=warn".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.data_dir);

    match cli.command {
        Commands::Books(cmd) => match cmd {
            BookCommands::List => commands::books::list(&config)?,
            BookCommands::Create { name } => commands::books::create(&config, &name)?,
        },
        Commands::Import { book, input } => {
            commands::transfer::import(&config, &book, &input)?;
        }
        Commands::Export { book, output } => {
            commands::transfer::export(&config, &book, output.as_deref())?;
        }
        Commands::Prefs(cmd) => match cmd {
            PrefCommands::Show => commands::prefs::show(&config).await?,
            PrefCommands::Set { key, value } => commands::prefs::set(&config, &key, &value).await?,
            PrefCommands::Reset => commands::prefs::reset(&config).await?,
        },
        Commands::Scan {
            book,
            second_book,
            auto_remove,
            preserve_first,
            non_interactive,
        } => {
            let options = commands::scan::ScanArgs {
                auto_remove,
                preserve_first,
                interactive: !non_interactive,
            };
            commands::scan::run(&config, &book, second_book.as_deref(), options).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "dupcards", &mut io::stdout());
        }
    }

    Ok(())
}
