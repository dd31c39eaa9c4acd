// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Field Classification
//!
//! Maps the host store's field names onto the categories that drive
//! normalization, matching and merging. The known vocabulary is resolved
//! through a table built once; names the host invents fall back to the
//! suffix rules the table itself is derived from.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Virtual set of all names of a record (never stored).
pub const NAMES: &str = "__Names";
/// Virtual set of mailing lists a record belongs to.
pub const MAIL_LIST_NAMES: &str = "__MailListNames";
/// Virtual set of canonical email addresses.
pub const EMAILS: &str = "__Emails";
/// Virtual set of canonical phone numbers.
pub const PHONE_NUMBERS: &str = "__PhoneNumbers";
/// Meta property: number of non-empty considered fields.
pub const NON_EMPTY_FIELDS: &str = "__NonEmptyFields";
/// Meta property: character weight of a record.
pub const CHAR_WEIGHT: &str = "__CharWeight";

pub const FIRST_NAME: &str = "FirstName";
pub const LAST_NAME: &str = "LastName";
pub const DISPLAY_NAME: &str = "DisplayName";
pub const SCREEN_NAME: &str = "_AimScreenName";
pub const PRIMARY_EMAIL: &str = "PrimaryEmail";
pub const SECOND_EMAIL: &str = "SecondEmail";
pub const NOTES: &str = "Notes";
pub const PHOTO_URI: &str = "PhotoURI";
pub const POPULARITY_INDEX: &str = "PopularityIndex";
pub const LAST_MODIFIED_DATE: &str = "LastModifiedDate";

/// Email slots, in assignment order.
pub const EMAIL_FIELDS: [&str; 2] = [PRIMARY_EMAIL, SECOND_EMAIL];

/// Phone slots, in the order merged numbers are assigned to them.
pub const PHONE_FIELDS: [&str; 5] = [
    "CellularNumber",
    "WorkPhone",
    "HomePhone",
    "PagerNumber",
    "FaxNumber",
];

/// Phone slots compared by the matcher.
///
/// HomePhone and FaxNumber are left out: they are often shared by a whole
/// household.
pub const MATCHED_PHONE_FIELDS: [&str; 3] = ["CellularNumber", "PagerNumber", "WorkPhone"];

pub const WEB_PAGE_FIELDS: [&str; 2] = ["WebPage1", "WebPage2"];

pub const CUSTOM_FIELDS: [&str; 4] = ["Custom1", "Custom2", "Custom3", "Custom4"];

/// The field vocabulary shared with the host contact store.
pub const ADDRESS_BOOK_FIELDS: &[&str] = &[
    "PhotoURI",
    "PhotoType",
    "PhotoName",
    "NickName",
    NAMES,
    "FirstName",
    "PhoneticFirstName",
    "LastName",
    "PhoneticLastName",
    "SpouseName",
    "FamilyName",
    "DisplayName",
    "_PhoneticName",
    "PreferDisplayName",
    "_AimScreenName",
    "_GoogleTalk",
    "CardType",
    "Category",
    "AllowRemoteContent",
    "PreferMailFormat",
    MAIL_LIST_NAMES,
    EMAILS,
    "DefaultEmail",
    "PrimaryEmail",
    "SecondEmail",
    PHONE_NUMBERS,
    "CellularNumber",
    "CellularNumberType",
    "HomePhone",
    "HomePhoneType",
    "WorkPhone",
    "WorkPhoneType",
    "FaxNumber",
    "FaxNumberType",
    "PagerNumber",
    "PagerNumberType",
    "DefaultAddress",
    "HomeAddress",
    "HomeAddress2",
    "HomeCity",
    "HomeState",
    "HomeZipCode",
    "HomeCountry",
    "WorkAddress",
    "WorkAddress2",
    "WorkCity",
    "WorkState",
    "WorkZipCode",
    "WorkCountry",
    "JobTitle",
    "Department",
    "Company",
    "BirthYear",
    "BirthMonth",
    "BirthDay",
    "WebPage1",
    "WebPage2",
    "Custom1",
    "Custom2",
    "Custom3",
    "Custom4",
    "Notes",
    "PopularityIndex",
    "LastModifiedDate",
    "UID",
    "UUID",
    "CardUID",
    "groupDavKey",
    "groupDavVersion",
    "groupDavVersionPrev",
    "RecordKey",
    "DbRowID",
    "unprocessed:rev",
    "unprocessed:x-ablabel",
];

/// Fields ignored unless the user configures otherwise.
///
/// Identifiers and revision bookkeeping differ between any two records, so
/// comparing them would make every pair look conflicting.
pub const DEFAULT_IGNORED_FIELDS: &[&str] = &[
    "PhotoType",
    "PhotoName",
    "CellularNumberType",
    "HomePhoneType",
    "WorkPhoneType",
    "FaxNumberType",
    "PagerNumberType",
    "UID",
    "UUID",
    "CardUID",
    "groupDavKey",
    "groupDavVersion",
    "groupDavVersionPrev",
    "RecordKey",
    "DbRowID",
    "unprocessed:rev",
    "unprocessed:x-ablabel",
];

/// Suffixes marking free-text fields.
const TEXT_SUFFIXES: &[&str] = &[
    "Name",
    "GoogleTalk",
    "Address",
    "City",
    "State",
    "Country",
    "Title",
    "Department",
    "Company",
    "WebPage",
    "Custom",
    "Notes",
];

/// Category of a contact field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    /// FirstName, LastName and DisplayName. Also free text.
    Name,
    /// Other free-text fields (addresses, titles, notes, ...).
    Text,
    Email,
    Phone,
    /// Enumerated settings such as the preferred mail format.
    Selection,
    Numeric,
    /// Set-valued virtual fields.
    Set,
    /// Derived properties that only exist while comparing records.
    Meta,
    /// Anything else (photo URI, birthday parts, identifiers, ...).
    Other,
}

impl FieldCategory {
    /// Returns true for name and other free-text fields.
    pub fn is_text(self) -> bool {
        matches!(self, FieldCategory::Name | FieldCategory::Text)
    }

    /// Value a field of this category has when the record does not set it.
    pub fn default_value(self) -> &'static str {
        match self {
            FieldCategory::Selection | FieldCategory::Numeric => "0",
            FieldCategory::Set => "{}",
            _ => "",
        }
    }
}

static CATEGORY_TABLE: LazyLock<HashMap<&'static str, FieldCategory>> = LazyLock::new(|| {
    ADDRESS_BOOK_FIELDS
        .iter()
        .chain([NON_EMPTY_FIELDS, CHAR_WEIGHT].iter())
        .map(|name| (*name, classify_by_pattern(name)))
        .collect()
});

/// Returns the category of a field.
pub fn classify(field: &str) -> FieldCategory {
    CATEGORY_TABLE
        .get(field)
        .copied()
        .unwrap_or_else(|| classify_by_pattern(field))
}

/// Returns the default value of a field.
pub fn default_value(field: &str) -> &'static str {
    classify(field).default_value()
}

/// Returns true for fields that exist only in the derived layer.
///
/// These must never be written back to the store.
pub fn is_virtual(field: &str) -> bool {
    field.starts_with("__")
}

fn classify_by_pattern(field: &str) -> FieldCategory {
    match field {
        FIRST_NAME | LAST_NAME | DISPLAY_NAME => FieldCategory::Name,
        PRIMARY_EMAIL | SECOND_EMAIL => FieldCategory::Email,
        "WorkPhone" | "HomePhone" | "FaxNumber" | "PagerNumber" | "CellularNumber" => {
            FieldCategory::Phone
        }
        "PreferMailFormat" | "PreferDisplayName" | "AllowRemoteContent" => {
            FieldCategory::Selection
        }
        POPULARITY_INDEX | LAST_MODIFIED_DATE | "RecordKey" | "DbRowID" => FieldCategory::Numeric,
        MAIL_LIST_NAMES | EMAILS | PHONE_NUMBERS => FieldCategory::Set,
        NON_EMPTY_FIELDS | CHAR_WEIGHT => FieldCategory::Meta,
        _ if TEXT_SUFFIXES.iter().any(|suffix| field.ends_with(suffix)) => FieldCategory::Text,
        _ => FieldCategory::Other,
    }
}
