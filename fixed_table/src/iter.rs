//! Scans over the live records of a [FixedTable].
//!
//! All scans visit records in slot order, which is unrelated to the order of insertion.
use crate::{slot::Slot, table::FixedTable};

/// Iterator yielding references to a table's records.
///
/// This struct is created by the [iter](FixedTable::iter) method on [FixedTable].
pub struct Iter<'a, R> {
    slots: std::slice::Iter<'a, Slot<R>>,
    remaining: usize,
}

impl<'a, R> Iter<'a, R> {
    pub(crate) fn new(slots: &'a [Slot<R>], len: usize) -> Self {
        Iter {
            slots: slots.iter(),
            remaining: len,
        }
    }
}

impl<R> Clone for Iter<'_, R> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let record = self.slots.by_ref().find_map(Slot::record)?;
        self.remaining -= 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for Iter<'_, R> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// Iterator yielding mutable references to a table's records.
///
/// This struct is created by the [iter_mut](FixedTable::iter_mut) method on [FixedTable].
pub struct IterMut<'a, R> {
    slots: std::slice::IterMut<'a, Slot<R>>,
    remaining: usize,
}

impl<'a, R> IterMut<'a, R> {
    pub(crate) fn new(slots: &'a mut [Slot<R>], len: usize) -> Self {
        IterMut {
            slots: slots.iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, R> Iterator for IterMut<'a, R> {
    type Item = &'a mut R;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let record = self.slots.by_ref().find_map(Slot::record_mut)?;
        self.remaining -= 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for IterMut<'_, R> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// A detached cursor for scanning a table step by step.
///
/// The cursor only stores a slot position, so the table is not borrowed between calls to
/// [next](Self::next) and may be modified. Records entered or removed during a scan may or may
/// not be visited; the scan itself always terminates after passing the last slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeqScan {
    cursor: usize,
}

impl SeqScan {
    /// Returns a cursor positioned at the first slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the cursor back to the first slot.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the slot position of the cursor.
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn advance<R>(&mut self, slots: &[Slot<R>]) -> Option<usize> {
        let offset = slots
            .get(self.cursor..)?
            .iter()
            .position(Slot::is_occupied);
        match offset {
            Some(offset) => {
                let index = self.cursor + offset;
                self.cursor = index + 1;
                Some(index)
            }
            None => {
                self.cursor = slots.len();
                None
            }
        }
    }

    /// Returns the next live record at or after the cursor and moves the cursor past it.
    ///
    /// Returns `None` once all slots have been visited.
    pub fn next<'a, R, H, E>(&mut self, table: &'a FixedTable<R, H, E>) -> Option<&'a R> {
        let index = self.advance(table.slots())?;
        table.slots()[index].record()
    }

    /// Like [next](Self::next), but returns the record for modification.
    ///
    /// Record keys must not be changed.
    pub fn next_mut<'a, R, H, E>(
        &mut self,
        table: &'a mut FixedTable<R, H, E>,
    ) -> Option<&'a mut R> {
        let index = self.advance(table.slots())?;
        table.slot_mut(index).record_mut()
    }
}
