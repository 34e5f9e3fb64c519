//! Free-text filter term

/// The staged and applied filter term.
///
/// Keystrokes stage a term; after the debounce the staged term is committed
/// and becomes the one passed to the source. An empty term means no filter.
/// The term is otherwise passed through unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterModel {
    staged: Option<String>,
    applied: Option<String>,
}

impl FilterModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `term`. Returns whether it differs from the applied term.
    pub fn stage(&mut self, term: &str) -> bool {
        self.staged = normalize(term);
        self.staged != self.applied
    }

    /// Applies the staged term. Returns the new term when it changed.
    pub fn commit(&mut self) -> Option<Option<String>> {
        if self.staged == self.applied {
            return None;
        }
        self.applied = self.staged.clone();
        Some(self.applied.clone())
    }

    /// The term sent with fetches.
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// The term last typed, possibly not yet applied.
    pub fn staged(&self) -> Option<&str> {
        self.staged.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.staged != self.applied
    }
}

fn normalize(term: &str) -> Option<String> {
    if term.is_empty() {
        None
    } else {
        Some(term.to_string())
    }
}
