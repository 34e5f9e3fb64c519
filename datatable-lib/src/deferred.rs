//! Single-slot deferred work

/// Identifies one arming of a [`DeferredSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotToken(u64);

/// A slot holding at most one pending deferred action.
///
/// Arming the slot hands out a token and invalidates every earlier one. The
/// timer task that holds the token calls [`fire`](Self::fire) when it wakes
/// up; only the latest token fires, and only once. This gives debounce
/// semantics without aborting the superseded timers.
///
/// # Example
///
/// ```
/// use datatable_lib::deferred::DeferredSlot;
///
/// let mut slot = DeferredSlot::new();
/// let first = slot.arm();
/// let second = slot.arm();
///
/// assert!(!slot.fire(first));
/// assert!(slot.fire(second));
/// assert!(!slot.fire(second));
/// ```
#[derive(Debug, Default)]
pub struct DeferredSlot {
    latest: u64,
    armed: bool,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot, superseding any pending action.
    pub fn arm(&mut self) -> SlotToken {
        self.latest += 1;
        self.armed = true;
        SlotToken(self.latest)
    }

    /// Consumes the slot if `token` is the latest arming.
    pub fn fire(&mut self, token: SlotToken) -> bool {
        if self.armed && token.0 == self.latest {
            self.armed = false;
            true
        } else {
            false
        }
    }

    /// Drops the pending action, if any.
    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel() {
        let mut slot = DeferredSlot::new();
        let token = slot.arm();
        slot.cancel();
        assert!(!slot.is_armed());
        assert!(!slot.fire(token));
    }

    #[test]
    fn test_rearm_after_fire() {
        let mut slot = DeferredSlot::new();
        let first = slot.arm();
        assert!(slot.fire(first));

        let second = slot.arm();
        assert_ne!(first, second);
        assert!(slot.fire(second));
    }
}
