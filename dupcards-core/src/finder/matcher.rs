// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pairwise duplicate predicate over comparable views.

use std::fmt;

use super::view::ComparableView;

/// Why two views were considered duplicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchReason {
    Names,
    Emails,
    Phones,
    /// Neither record carries any name, email or phone number.
    NoSignal,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MatchReason::Names => "names",
            MatchReason::Emails => "email",
            MatchReason::Phones => "phone number",
            MatchReason::NoSignal => "no identifying data",
        };
        f.write_str(text)
    }
}

/// Returns true if the names are equal, or one is a whole-word part of the
/// other that is at least two characters shorter.
///
/// "john smith" contains "smith", but not "smi".
pub fn name_substring_equal(a: &str, b: &str) -> bool {
    a == b || contains_as_words(a, b) || contains_as_words(b, a)
}

fn contains_as_words(longer: &str, shorter: &str) -> bool {
    !shorter.is_empty()
        && shorter.chars().count() + 2 <= longer.chars().count()
        && (longer.starts_with(&format!("{} ", shorter))
            || longer.contains(&format!(" {} ", shorter))
            || longer.ends_with(&format!(" {}", shorter)))
}

/// Name rules: screen name, display name, first and last name, or a lone
/// first or last name against the other side's display name.
pub fn names_match(a: &ComparableView, b: &ComparableView) -> bool {
    let eq = name_substring_equal;
    let (f1, l1, d1, s1) = (&a.first_name, &a.last_name, &a.display_name, &a.screen_name);
    let (f2, l2, d2, s2) = (&b.first_name, &b.last_name, &b.display_name, &b.screen_name);

    (!s1.is_empty() && !s2.is_empty() && eq(s1, s2))
        || (!d1.is_empty()
            && !d2.is_empty()
            && d1.contains(' ') == d2.contains(' ')
            && eq(d1, d2))
        || (!f1.is_empty()
            && !l1.is_empty()
            && !f2.is_empty()
            && !l2.is_empty()
            && eq(f1, f2)
            && eq(l1, l2))
        || (d1.is_empty()
            && d2.is_empty()
            && (!f1.is_empty() || !l1.is_empty())
            && eq(f1, f2)
            && eq(l1, l2))
        || partial_name_matches_display(a, b)
        || partial_name_matches_display(b, a)
}

// `a` has no display name and exactly one of first and last name.
fn partial_name_matches_display(a: &ComparableView, b: &ComparableView) -> bool {
    let (first, last, display) = (&a.first_name, &a.last_name, &b.display_name);
    a.display_name.is_empty()
        && !display.is_empty()
        && first.is_empty() != last.is_empty()
        && (name_substring_equal(first, display) || name_substring_equal(last, display))
}

/// Returns true if a non-empty address of one side equals one of the other.
pub fn emails_match(a: &ComparableView, b: &ComparableView) -> bool {
    a.emails()
        .iter()
        .any(|mail| !mail.is_empty() && b.emails().contains(mail))
}

/// Returns true if a non-empty matched phone number of one side equals one
/// of the other.
pub fn phones_match(a: &ComparableView, b: &ComparableView) -> bool {
    a.phones
        .iter()
        .any(|phone| !phone.is_empty() && b.phones.contains(phone))
}

/// Decides whether two views describe the same person.
///
/// Different screen names rule a match out. Otherwise names, emails and
/// phone numbers are tried in turn; two records without any of them match
/// so that they surface for review.
pub fn match_reason(a: &ComparableView, b: &ComparableView) -> Option<MatchReason> {
    if a.screen_name != b.screen_name {
        return None;
    }
    if names_match(a, b) {
        Some(MatchReason::Names)
    } else if emails_match(a, b) {
        Some(MatchReason::Emails)
    } else if phones_match(a, b) {
        Some(MatchReason::Phones)
    } else if a.has_no_names()
        && b.has_no_names()
        && a.has_no_contact_points()
        && b.has_no_contact_points()
    {
        Some(MatchReason::NoSignal)
    } else {
        None
    }
}

pub fn views_match(a: &ComparableView, b: &ComparableView) -> bool {
    match_reason(a, b).is_some()
}
