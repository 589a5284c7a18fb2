//! Detects shared references that lead back to themselves while writing.

use std::collections::HashSet;

use crate::error::SerializeError;

/// Addresses of the shared values currently being written, outermost first.
///
/// Identity is the pointee address, so two `Arc`s to one record are the same
/// entry and two equal records behind different `Arc`s are not.
#[derive(Debug, Default)]
pub struct CycleGuard {
    active: HashSet<usize>,
}

impl CycleGuard {
    /// An empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `address` as being written; fails if it already is.
    pub fn enter(&mut self, address: usize, type_name: &'static str) -> Result<(), SerializeError> {
        if self.active.insert(address) {
            Ok(())
        } else {
            trace!(address, type_name, "cycle guard tripped");
            Err(SerializeError::Cycle { type_name })
        }
    }

    /// Done writing `address`.
    pub fn leave(&mut self, address: usize) {
        self.active.remove(&address);
    }

    /// Forget everything, after a call that ended early.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Whether nothing is being written.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[test]
    fn reentry_is_a_cycle_until_left() {
        let mut guard = CycleGuard::new();
        guard.enter(0x10, "Node").unwrap();
        guard.enter(0x20, "Node").unwrap();
        assert!(matches!(
            guard.enter(0x10, "Node"),
            Err(SerializeError::Cycle { type_name: "Node" })
        ));
        guard.leave(0x10);
        // siblings may share a target once the first visit has finished
        guard.enter(0x10, "Node").unwrap();
        guard.clear();
        assert!(guard.is_empty());
    }
}
