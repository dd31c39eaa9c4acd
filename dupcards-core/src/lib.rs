// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dupcards Core Library
//!
//! Finds duplicate address-book records and reconciles them.
//! Records are normalized into comparable views, matched pairwise, compared
//! for completeness, and merged into the record the user keeps.

pub mod card;
pub mod error;
pub mod finder;
pub mod normalize;
pub mod preferences;
pub mod scan;
pub mod store;

pub use card::{CardError, FieldCategory, FieldMap, FieldValue, Record, ValueSet};
pub use error::{DupError, DupResult};
pub use finder::{
    ComparableView, Comparison, Completeness, DuplicateFinder, MatchReason, MergeResult,
    ViewCache,
};
pub use normalize::{Normalizer, PhoneRules};
pub use preferences::{
    load_preferences, save_preferences, PreferenceBag, PreferenceError, PreferenceStore,
    Preferences,
};
pub use scan::{
    CallbackHandler, DuplicatePair, EventDispatcher, EventHandler, ScanDriver, ScanError,
    ScanEvent, ScanOptions, ScanState, ScanSummary, Side, StopHandle,
};
pub use store::{BookInfo, MemoryStore, RecordStore, SqliteStore, StoreError};
