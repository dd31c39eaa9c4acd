// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error Types
//!
//! Unified error type for hosts that drive the whole library.

use thiserror::Error;

use crate::card::CardError;
use crate::preferences::PreferenceError;
use crate::scan::ScanError;
use crate::store::StoreError;

/// Unified error type for Dupcards operations.
#[derive(Error, Debug)]
pub enum DupError {
    /// Record store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A preference could not be read or written.
    #[error("preference error: {0}")]
    Preference(#[from] PreferenceError),

    /// A record held a value of the wrong shape.
    #[error("card error: {0}")]
    Card(#[from] CardError),

    /// Scan session error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
}

/// Result type alias for Dupcards operations.
pub type DupResult<T> = Result<T, DupError>;
