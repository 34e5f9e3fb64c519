//! Transient notices

use std::fmt;

use serde::Serialize;

use crate::deferred::DeferredSlot;
use crate::deferred::SlotToken;

/// A short-lived message for the user. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// Find found no match anywhere.
    NotFound { term: String },
    /// Find next/previous wrapped around the end of the data.
    Wrapped { term: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NotFound { term } => write!(f, "'{term}' not found"),
            Notice::Wrapped { term } => write!(f, "Search for '{term}' wrapped"),
        }
    }
}

/// Holds the current notice; a newer notice replaces it and restarts the
/// expiry.
#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<Notice>,
    expiry: DeferredSlot,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `notice`. The returned token expires it.
    pub fn show(&mut self, notice: Notice) -> SlotToken {
        self.current = Some(notice);
        self.expiry.arm()
    }

    /// Clears the notice if `token` is from the most recent [`show`](Self::show).
    pub fn expire(&mut self, token: SlotToken) -> bool {
        if self.expiry.fire(token) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.expiry.cancel();
        self.current = None;
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }
}
