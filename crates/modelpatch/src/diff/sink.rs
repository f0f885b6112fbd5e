//! Receivers for emitted changes.

use crate::change::Change;

/// Receives each change at the moment it is produced, in emission order.
///
/// List index paths in emitted changes are only valid against the list state
/// at the moment of emission, so a sink must not reorder what it receives.
pub trait ChangeSink {
    fn push(&mut self, change: Change);
}

impl ChangeSink for Vec<Change> {
    fn push(&mut self, change: Change) {
        Vec::push(self, change);
    }
}

/// Swallows everything. Used while populating a freshly created value whose
/// content is carried by the single enclosing `add`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl ChangeSink for Discard {
    fn push(&mut self, _change: Change) {}
}

/// Counts changes without keeping them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Count(pub usize);

impl ChangeSink for Count {
    fn push(&mut self, _change: Change) {
        self.0 += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelpatch_pointer::Pointer;

    #[test]
    fn sinks() {
        let change = Change::remove(Pointer::from_tokens(["a"]));
        let mut all: Vec<Change> = Vec::new();
        ChangeSink::push(&mut all, change.clone());
        assert_eq!(all, [change.clone()]);

        let mut count = Count::default();
        count.push(change.clone());
        count.push(change.clone());
        assert_eq!(count.0, 2);

        Discard.push(change);
    }
}
