//! Dirty flags driving the two-tier flush debounce.

/// Tracks whether durable state is behind the registry.
///
/// `revision` counts mutations so that a write started before a mutation
/// does not clear the flags that mutation raised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtyFlags {
    flush_required: bool,
    urgent_flush_required: bool,
    revision: u64,
}

impl DirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// An entry fired. Captured by the soft tick.
    pub fn mark_expired(&mut self) {
        self.flush_required = true;
        self.revision += 1;
    }

    /// The pending set changed through registration or cancellation.
    pub fn mark_changed(&mut self) {
        self.urgent_flush_required = true;
        self.revision += 1;
    }

    pub fn flush_required(&self) -> bool {
        self.flush_required
    }

    pub fn urgent_flush_required(&self) -> bool {
        self.urgent_flush_required
    }

    /// Soft tick condition: either flag set.
    pub fn is_dirty(&self) -> bool {
        self.flush_required || self.urgent_flush_required
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Clear both flags after a successful write of state at `revision`.
    ///
    /// Returns false, leaving the flags set, if anything changed since.
    pub fn clear_if_current(&mut self, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.flush_required = false;
        self.urgent_flush_required = false;
        true
    }
}
