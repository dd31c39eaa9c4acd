// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Phone number canonicalization.

use crate::preferences::Preferences;

/// Dialing rules used to rewrite national and international prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoneRules {
    trunk_prefix: String,
    international_prefix: String,
    country_code: String,
}

impl PhoneRules {
    /// Creates rules from validated preferences.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        PhoneRules {
            trunk_prefix: prefs.national_trunk_prefix.clone(),
            international_prefix: prefs.international_call_prefix.clone(),
            country_code: prefs.default_country_calling_code.clone(),
        }
    }

    /// Rewrites a pruned number into international form where the rules allow.
    ///
    /// `0301234` becomes `+49301234` with trunk prefix `0` and code `+49`;
    /// `0049301234` becomes `+49301234` with international prefix `00`.
    pub fn canonicalize(&self, number: &str) -> String {
        let mut number = number.to_string();
        if !self.country_code.is_empty() {
            if let Some(rest) = strip_dial_prefix(&number, &self.trunk_prefix) {
                number = format!("{}{}", self.country_code, rest);
            }
        }
        if let Some(rest) = strip_dial_prefix(&number, &self.international_prefix) {
            number = format!("+{}", rest);
        }
        number
    }
}

/// Keeps digits and a single leading plus sign.
pub fn prune_number(text: &str) -> String {
    let leading_plus = text
        .chars()
        .find(|c| *c == '+' || c.is_ascii_digit())
        .is_some_and(|c| c == '+');
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if leading_plus {
        format!("+{}", digits)
    } else {
        digits
    }
}

// The prefix only counts when a non-zero digit follows it.
fn strip_dial_prefix<'a>(number: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let rest = number.strip_prefix(prefix)?;
    match rest.chars().next() {
        Some('1'..='9') => Some(rest),
        _ => None,
    }
}
