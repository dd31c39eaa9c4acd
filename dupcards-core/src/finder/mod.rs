// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicate Finder
//!
//! Matching, comparison and merging of contact records, configured by an
//! explicitly constructed [`DuplicateFinder`]. Each scan session owns its
//! own finder; nothing here is process-wide.

pub mod compare;
pub mod matcher;
pub mod merge;
pub mod view;

pub use compare::{Comparison, Completeness};
pub use matcher::{name_substring_equal, MatchReason};
pub use merge::MergeResult;
pub use view::{ComparableView, ViewCache};

use crate::card::{CardError, Record};
use crate::normalize::Normalizer;
use crate::preferences::Preferences;

/// Duplicate detection and reconciliation for one session.
#[derive(Clone, Debug)]
pub struct DuplicateFinder {
    preferences: Preferences,
    normalizer: Normalizer,
}

impl DuplicateFinder {
    /// Creates a finder for the given preferences.
    pub fn new(preferences: Preferences) -> Self {
        let normalizer = Normalizer::new(&preferences);
        DuplicateFinder {
            preferences,
            normalizer,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Builds the comparable view of a record.
    pub fn simplify(&self, record: &Record) -> Result<ComparableView, CardError> {
        view::simplify(&self.normalizer, record)
    }

    /// Returns why two records are duplicates, or `None` if they are not.
    pub fn match_records(&self, a: &Record, b: &Record) -> Result<Option<MatchReason>, CardError> {
        Ok(matcher::match_reason(&self.simplify(a)?, &self.simplify(b)?))
    }

    pub fn views_match(&self, a: &ComparableView, b: &ComparableView) -> bool {
        matcher::views_match(a, b)
    }

    /// Compares the completeness of two records.
    pub fn compare(&self, a: &Record, b: &Record) -> Comparison {
        compare::compare(&self.normalizer, a, b)
    }

    /// Merges `other` into `keep`.
    pub fn merge(&self, keep: &Record, other: &Record) -> MergeResult {
        merge::merge(&self.normalizer, keep, other)
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        DuplicateFinder::new(Preferences::default())
    }
}
