// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Completeness comparison of two records.
//!
//! Used to decide, without asking, which record of a duplicate pair can be
//! removed: one that holds nothing the other lacks.

use std::collections::BTreeSet;

use crate::card::field::{
    EMAILS, LAST_MODIFIED_DATE, MAIL_LIST_NAMES, PHONE_NUMBERS, POPULARITY_INDEX,
};
use crate::card::{classify, default_value, is_virtual, FieldCategory, Record};
use crate::normalize::{char_weight, Normalizer};

/// How the first record relates to the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completeness {
    /// Everything the first holds is also in the second, which has more.
    LessComplete,
    /// The first holds everything of the second, and more.
    MoreComplete,
    /// Both hold the same information.
    Equivalent,
    /// Each holds something the other lacks.
    Incomparable,
}

impl Completeness {
    /// Numeric code: -1, 1, 0 and -2 respectively.
    pub fn code(self) -> i8 {
        match self {
            Completeness::LessComplete => -1,
            Completeness::MoreComplete => 1,
            Completeness::Equivalent => 0,
            Completeness::Incomparable => -2,
        }
    }

    /// The relation seen from the other record.
    pub fn reverse(self) -> Self {
        match self {
            Completeness::LessComplete => Completeness::MoreComplete,
            Completeness::MoreComplete => Completeness::LessComplete,
            other => other,
        }
    }
}

/// Result of comparing two records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub completeness: Completeness,
    /// Tie-break score; negative means removing the first record is preferred.
    pub preference: i64,
}

impl Comparison {
    pub fn prefers_removing_first(&self) -> bool {
        self.preference < 0
    }

    /// The comparison seen from the other record.
    pub fn reverse(self) -> Self {
        Comparison {
            completeness: self.completeness.reverse(),
            preference: self.preference.saturating_neg(),
        }
    }

    /// Returns true if one record can be removed without losing data.
    pub fn allows_removal(&self) -> bool {
        self.completeness != Completeness::Incomparable
    }
}

/// Compares the information held by two records.
pub fn compare(normalizer: &Normalizer, a: &Record, b: &Record) -> Comparison {
    let mut a_less = false;
    let mut b_less = false;
    let mut all_equivalent = true;

    for field in compared_fields(normalizer, a, b) {
        let category = classify(&field);
        let (less_a, less_b) = if category == FieldCategory::Set {
            let set_a = normalizer.canonical_set(a, &field);
            let set_b = normalizer.canonical_set(b, &field);
            if set_a == set_b {
                continue;
            }
            (!set_a.is_superset(&set_b), !set_b.is_superset(&set_a))
        } else {
            let value_a = normalizer.canonical(a, &field);
            let value_b = normalizer.canonical(b, &field);
            if value_a == value_b {
                continue;
            }
            if category.is_text() {
                match (value_b.contains(&value_a), value_a.contains(&value_b)) {
                    (false, false) => (true, true),
                    contained => contained,
                }
            } else {
                let default = default_value(&field);
                match (value_a == default, value_b == default) {
                    (false, false) => (true, true),
                    missing => missing,
                }
            }
        };
        all_equivalent = false;
        a_less |= less_a;
        b_less |= less_b;
    }

    let completeness = match (a_less, b_less) {
        (true, false) => Completeness::LessComplete,
        (false, true) => Completeness::MoreComplete,
        _ if all_equivalent => Completeness::Equivalent,
        _ => Completeness::Incomparable,
    };
    let preference = match completeness {
        Completeness::LessComplete | Completeness::MoreComplete => {
            i64::from(completeness.code())
        }
        _ => removal_preference(normalizer, a, b),
    };

    Comparison {
        completeness,
        preference,
    }
}

/// Fields considered for completeness: everything either record carries
/// plus the derived sets, minus ignored, numeric and meta fields. Email and
/// phone slots are covered by their sets.
fn compared_fields(normalizer: &Normalizer, a: &Record, b: &Record) -> BTreeSet<String> {
    a.field_names()
        .chain(b.field_names())
        .filter(|field| !is_virtual(field))
        .chain([EMAILS, PHONE_NUMBERS, MAIL_LIST_NAMES])
        .filter(|field| !normalizer.is_ignored(field))
        .filter(|field| {
            !matches!(
                classify(field),
                FieldCategory::Numeric
                    | FieldCategory::Meta
                    | FieldCategory::Email
                    | FieldCategory::Phone
            )
        })
        .map(str::to_string)
        .collect()
}

/// Deterministic removal preference between two records of equal
/// completeness.
///
/// Decided by the number of non-empty fields, then the character weight,
/// then popularity, then modification time. A negative value prefers
/// removing `a`.
pub fn removal_preference(normalizer: &Normalizer, a: &Record, b: &Record) -> i64 {
    let (count_a, weight_a) = information(normalizer, a);
    let (count_b, weight_b) = information(normalizer, b);
    let differences = [
        count_a as i128 - count_b as i128,
        weight_a as i128 - weight_b as i128,
        i128::from(a.number(POPULARITY_INDEX)) - i128::from(b.number(POPULARITY_INDEX)),
        i128::from(a.number(LAST_MODIFIED_DATE)) - i128::from(b.number(LAST_MODIFIED_DATE)),
    ];
    let difference = differences
        .into_iter()
        .find(|difference| *difference != 0)
        .unwrap_or(0);
    // Clamped symmetrically so that swapping the records negates the result.
    difference.clamp(-i128::from(i64::MAX), i128::from(i64::MAX)) as i64
}

// Number of non-empty considered fields and their total character weight.
fn information(normalizer: &Normalizer, record: &Record) -> (usize, usize) {
    let mut count = 0;
    let mut weight = 0;
    for field in record.field_names() {
        if is_virtual(field)
            || normalizer.is_ignored(field)
            || matches!(classify(field), FieldCategory::Numeric | FieldCategory::Meta)
        {
            continue;
        }
        let value = normalizer.pruned(record, field);
        if value != default_value(field) {
            count += 1;
            weight += char_weight(&value, field);
        }
    }
    (count, weight)
}
