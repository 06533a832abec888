//! Slots of a table's backing storage.

/// The state of a single slot.
///
/// A slot starts out `Empty`, becomes `Occupied` when a record is inserted into it and turns into
/// a `Tombstone` when that record is removed. A later insertion may reclaim a `Tombstone`. Slots
/// only become `Empty` again when the whole table is cleaned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Slot<R> {
    /// Never used since construction or the last clean. Terminates probe sequences.
    #[default]
    Empty,
    /// Previously occupied. Skipped by lookups, reused by insertions.
    Tombstone,
    /// Holds a live record.
    Occupied(R),
}

impl<R> Slot<R> {
    /// Returns the record stored in this slot, if any.
    #[inline(always)]
    pub fn record(&self) -> Option<&R> {
        match self {
            Slot::Occupied(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the record stored in this slot for modification, if any.
    #[inline(always)]
    pub fn record_mut(&mut self) -> Option<&mut R> {
        match self {
            Slot::Occupied(record) => Some(record),
            _ => None,
        }
    }

    /// Returns `true` if the slot holds a live record.
    #[inline(always)]
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(_))
    }

    /// Returns `true` if the slot is a tombstone.
    #[inline(always)]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }

    /// Replaces a live record with a tombstone and returns the record.
    ///
    /// Leaves other slots unchanged and returns `None` for them.
    pub(crate) fn bury(&mut self) -> Option<R> {
        if !self.is_occupied() {
            return None;
        }
        match std::mem::replace(self, Slot::Tombstone) {
            Slot::Occupied(record) => Some(record),
            _ => unreachable!(),
        }
    }
}
