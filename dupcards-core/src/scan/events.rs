// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scan Events
//!
//! Callbacks through which a host follows a running scan.

use std::sync::Arc;

use super::{DuplicatePair, ScanState, Side};

/// Events emitted by the scan driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// The driver entered a new state.
    StateChanged {
        state: ScanState,
    },

    /// Pairs checked so far out of the total.
    Progress {
        checked: u64,
        total: u64,
    },

    /// A pair was recognized as duplicates.
    DuplicateFound {
        pair: DuplicatePair,
    },

    /// A record was removed without review.
    AutoRemoved {
        /// The side the removed record was on.
        side: Side,
        record_id: String,
    },

    /// The user skipped a queued pair.
    PairSkipped {
        pair: DuplicatePair,
    },

    /// A reviewed pair was merged into the kept record.
    Applied {
        kept_id: String,
        removed_id: String,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive scan events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: ScanEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(ScanEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(ScanEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(ScanEvent) + Send + Sync,
{
    fn on_event(&self, event: ScanEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: ScanEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
