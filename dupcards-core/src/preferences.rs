// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! User Preferences
//!
//! The flat option bag persisted by the host preference store, and its typed
//! form. A session loads the bag once and hands the typed value to the
//! finder; malformed entries are reported and fall back to their defaults
//! so that a bad setting never blocks a scan.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::card::field::DEFAULT_IGNORED_FIELDS;
use crate::store::StoreError;

/// Raw key/value bag as read from and written to the preference store.
pub type PreferenceBag = serde_json::Map<String, Value>;

pub const AUTO_REMOVE_DUPLICATES: &str = "autoRemoveDuplicates";
pub const PRESERVE_FIRST_ON_AUTO_REMOVE: &str = "preserveFirstOnAutoRemove";
pub const IGNORED_FIELDS: &str = "ignoredFields";
pub const NATIONAL_TRUNK_PREFIX: &str = "nationalTrunkPrefix";
pub const INTERNATIONAL_CALL_PREFIX: &str = "internationalCallPrefix";
pub const DEFAULT_COUNTRY_CALLING_CODE: &str = "defaultCountryCallingCode";

/// All recognized keys, in display order.
pub const PREFERENCE_KEYS: [&str; 6] = [
    AUTO_REMOVE_DUPLICATES,
    PRESERVE_FIRST_ON_AUTO_REMOVE,
    IGNORED_FIELDS,
    NATIONAL_TRUNK_PREFIX,
    INTERNATIONAL_CALL_PREFIX,
    DEFAULT_COUNTRY_CALLING_CODE,
];

static DIAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,4}$").unwrap());
static COUNTRY_CALLING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{0,3}$").unwrap());

/// Preference errors.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Malformed preference {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),
}

impl PreferenceError {
    fn malformed(key: &str, reason: impl Into<String>) -> Self {
        PreferenceError::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Typed preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Remove the less complete record of a pair without asking.
    pub auto_remove_duplicates: bool,
    /// Never auto-remove the record from the first side of a pair.
    pub preserve_first_on_auto_remove: bool,
    /// Fields left out of normalization, comparison and merging.
    pub ignored_fields: Vec<String>,
    /// Digits a national number starts with, e.g. "0".
    pub national_trunk_prefix: String,
    /// Digits that introduce an international number, e.g. "00".
    pub international_call_prefix: String,
    /// Calling code replacing the trunk prefix, e.g. "+49".
    pub default_country_calling_code: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            auto_remove_duplicates: false,
            preserve_first_on_auto_remove: false,
            ignored_fields: DEFAULT_IGNORED_FIELDS.iter().map(|f| f.to_string()).collect(),
            national_trunk_prefix: String::new(),
            international_call_prefix: String::new(),
            default_country_calling_code: String::new(),
        }
    }
}

impl Preferences {
    /// Builds preferences from a raw bag.
    ///
    /// Unknown keys are ignored and missing keys take their defaults. Every
    /// malformed value is returned as a warning and replaced by its default.
    pub fn from_bag(bag: &PreferenceBag) -> (Self, Vec<PreferenceError>) {
        let mut prefs = Preferences::default();
        let mut warnings = Vec::new();

        for (key, value) in bag {
            let result = match value {
                Value::Bool(_) | Value::Number(_) if key == IGNORED_FIELDS => Err(
                    PreferenceError::malformed(key, "expected a list of field names"),
                ),
                Value::String(text) => prefs.set(key, text),
                Value::Bool(flag) => prefs.set(key, if *flag { "true" } else { "false" }),
                Value::Array(items) if key == IGNORED_FIELDS => {
                    match items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                    {
                        Some(fields) => {
                            prefs.set_ignored_fields(fields);
                            Ok(())
                        }
                        None => Err(PreferenceError::malformed(key, "expected a list of field names")),
                    }
                }
                Value::Null => Ok(()),
                other if PREFERENCE_KEYS.contains(&key.as_str()) => Err(
                    PreferenceError::malformed(key, format!("unexpected value {}", other)),
                ),
                _ => Ok(()),
            };
            match result {
                Ok(()) => {}
                Err(PreferenceError::Malformed { key: k, .. })
                    if !PREFERENCE_KEYS.contains(&k.as_str()) => {}
                Err(err) => warnings.push(err),
            }
        }

        (prefs, warnings)
    }

    /// Returns the bag representation written to the preference store.
    pub fn to_bag(&self) -> PreferenceBag {
        let mut bag = PreferenceBag::new();
        bag.insert(
            AUTO_REMOVE_DUPLICATES.into(),
            Value::Bool(self.auto_remove_duplicates),
        );
        bag.insert(
            PRESERVE_FIRST_ON_AUTO_REMOVE.into(),
            Value::Bool(self.preserve_first_on_auto_remove),
        );
        bag.insert(
            IGNORED_FIELDS.into(),
            Value::Array(
                self.ignored_fields
                    .iter()
                    .map(|f| Value::String(f.clone()))
                    .collect(),
            ),
        );
        bag.insert(
            NATIONAL_TRUNK_PREFIX.into(),
            Value::String(self.national_trunk_prefix.clone()),
        );
        bag.insert(
            INTERNATIONAL_CALL_PREFIX.into(),
            Value::String(self.international_call_prefix.clone()),
        );
        bag.insert(
            DEFAULT_COUNTRY_CALLING_CODE.into(),
            Value::String(self.default_country_calling_code.clone()),
        );
        bag
    }

    /// Sets one option from its textual form.
    ///
    /// Lists are comma separated. On error the option keeps its previous value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let value = value.trim();
        match key {
            AUTO_REMOVE_DUPLICATES => self.auto_remove_duplicates = parse_flag(key, value)?,
            PRESERVE_FIRST_ON_AUTO_REMOVE => {
                self.preserve_first_on_auto_remove = parse_flag(key, value)?
            }
            IGNORED_FIELDS => self.set_ignored_fields(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            NATIONAL_TRUNK_PREFIX => self.national_trunk_prefix = parse_dial_prefix(key, value)?,
            INTERNATIONAL_CALL_PREFIX => {
                self.international_call_prefix = parse_dial_prefix(key, value)?
            }
            DEFAULT_COUNTRY_CALLING_CODE => {
                if !value.is_empty() && !COUNTRY_CALLING_CODE.is_match(value) {
                    return Err(PreferenceError::malformed(
                        key,
                        format!("'{}' is not a calling code like +49", value),
                    ));
                }
                self.default_country_calling_code = value.to_string();
            }
            _ => return Err(PreferenceError::malformed(key, "unknown preference")),
        }
        Ok(())
    }

    /// Returns the textual form of one option, as accepted by [`Preferences::set`].
    pub fn get(&self, key: &str) -> Option<String> {
        let text = match key {
            AUTO_REMOVE_DUPLICATES => self.auto_remove_duplicates.to_string(),
            PRESERVE_FIRST_ON_AUTO_REMOVE => self.preserve_first_on_auto_remove.to_string(),
            IGNORED_FIELDS => self.ignored_fields.join(", "),
            NATIONAL_TRUNK_PREFIX => self.national_trunk_prefix.clone(),
            INTERNATIONAL_CALL_PREFIX => self.international_call_prefix.clone(),
            DEFAULT_COUNTRY_CALLING_CODE => self.default_country_calling_code.clone(),
            _ => return None,
        };
        Some(text)
    }

    /// Returns true if the field is excluded from comparison.
    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored_fields.iter().any(|f| f == field)
    }

    // An empty list restores the defaults.
    fn set_ignored_fields(&mut self, fields: Vec<String>) {
        self.ignored_fields = if fields.is_empty() {
            Preferences::default().ignored_fields
        } else {
            fields
        };
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, PreferenceError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(PreferenceError::malformed(
            key,
            format!("'{}' is not a boolean", value),
        )),
    }
}

fn parse_dial_prefix(key: &str, value: &str) -> Result<String, PreferenceError> {
    if value.is_empty() || DIAL_PREFIX.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(PreferenceError::malformed(
            key,
            format!("'{}' must be one to four digits", value),
        ))
    }
}

/// Host preference store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads the whole bag. A store that was never written returns an empty bag.
    async fn get_all(&self) -> Result<PreferenceBag, StoreError>;

    /// Replaces the whole bag.
    async fn set_all(&self, bag: PreferenceBag) -> Result<(), StoreError>;
}

/// Loads preferences, logging and discarding malformed entries.
pub async fn load_preferences<P>(store: &P) -> Result<Preferences, PreferenceError>
where
    P: PreferenceStore + ?Sized,
{
    let bag = store.get_all().await?;
    let (prefs, warnings) = Preferences::from_bag(&bag);
    for warning in &warnings {
        warn!("{}, using default", warning);
    }
    Ok(prefs)
}

/// Persists preferences.
pub async fn save_preferences<P>(store: &P, prefs: &Preferences) -> Result<(), PreferenceError>
where
    P: PreferenceStore + ?Sized,
{
    store.set_all(prefs.to_bag()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_ignore_identifiers() {
        let prefs = Preferences::default();
        assert!(prefs.is_ignored("UID"));
        assert!(prefs.is_ignored("unprocessed:rev"));
        assert!(!prefs.is_ignored("FirstName"));
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("k", "Yes").unwrap());
        assert!(!parse_flag("k", "").unwrap());
        assert!(parse_flag("k", "maybe").is_err());
    }

    #[test]
    fn test_dial_prefix_must_be_digits() {
        assert_eq!(parse_dial_prefix("k", "00").unwrap(), "00");
        assert!(parse_dial_prefix("k", "0+").is_err());
        assert!(parse_dial_prefix("k", "00000").is_err());
    }
}
